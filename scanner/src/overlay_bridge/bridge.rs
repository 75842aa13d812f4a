use crate::overlay_bridge::model::{FrameSubmission, LayoutUpdate, OverlayModel};
use crate::pipeline::runner::{FrameDisposition, ScanRunner};
use anyhow::Result;
use scancore::boundary::state::BoundaryState;
use scancore::external::fetch::ProductFetcher;
use scancore::external::frame::{DecodeOracle, FrameHandle, FramePacket};
use scancore::prelude::{CodePayload, DetectedCode, ScanResult};
use scancore::session::events::SideEffect;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

fn overlay_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9100))
}

#[derive(Debug)]
struct BridgeError;

impl warp::reject::Reject for BridgeError {}

/// Decoder for a single injected frame: reports exactly what the caller
/// supplied, regardless of the handle.
struct InlineDecoder {
    detection: Option<DetectedCode>,
}

impl DecodeOracle for InlineDecoder {
    fn decode(&self, _handle: FrameHandle) -> ScanResult<Vec<DetectedCode>> {
        Ok(self.detection.iter().cloned().collect())
    }
}

/// Bridge hosting the overlay HTTP endpoint: publishes the latest overlay
/// model and accepts layout updates, frame submissions, and dismissals from
/// the presentation layer.
pub struct OverlayBridge {
    state: Arc<RwLock<OverlayModel>>,
}

impl OverlayBridge {
    pub fn new(
        runner: Arc<ScanRunner>,
        boundaries: Arc<BoundaryState>,
        fetcher: Arc<dyn ProductFetcher>,
    ) -> Self {
        let state = Arc::new(RwLock::new(OverlayModel::default()));
        let state_for_filter = state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());
        let boundaries_filter = warp::any().map(move || boundaries.clone());
        let fetcher_filter = warp::any().map(move || fetcher.clone());

        let get_route = warp::path("overlay")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<OverlayModel>>| warp::reply::json(&*state.read().unwrap()));

        let layout_route = warp::path("layout")
            .and(warp::post())
            .and(warp::body::json())
            .and(boundaries_filter)
            .map(|layout: LayoutUpdate, boundaries: Arc<BoundaryState>| {
                boundaries.set_viewport(layout.viewport);
                boundaries.set_scanning_window(layout.scanning_window);
                warp::reply::json(&json!({"status": "ok"}))
            });

        let frame_route = warp::path("frame")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .and(fetcher_filter)
            .and_then(
                |submission: FrameSubmission,
                 state: Arc<RwLock<OverlayModel>>,
                 runner: Arc<ScanRunner>,
                 fetcher: Arc<dyn ProductFetcher>| async move {
                    let status = ingest_frame(&submission, &runner, fetcher).await;
                    let mut guard = state.write().unwrap();
                    *guard = OverlayModel::from_runner(&runner);
                    Ok::<_, warp::Rejection>(warp::reply::with_status(
                        warp::reply::json(&json!({
                            "status": status,
                            "instruction": guard.instruction.clone(),
                        })),
                        StatusCode::OK,
                    ))
                },
            );

        let dismiss_route = warp::path("dismiss")
            .and(warp::post())
            .and(state_filter)
            .and(runner_filter)
            .map(
                |state: Arc<RwLock<OverlayModel>>, runner: Arc<ScanRunner>| {
                    let transition = runner.dismiss();
                    let resumed = transition.effects.contains(&SideEffect::ResumeCamera);
                    let mut guard = state.write().unwrap();
                    *guard = OverlayModel::from_runner(&runner);
                    warp::reply::json(&json!({"status": "ok", "resumed": resumed}))
                },
            );

        thread::spawn(move || {
            let routes = get_route
                .or(layout_route)
                .or(frame_route)
                .or(dismiss_route);
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(async move {
                warp::serve(routes).run(overlay_bind_address()).await;
            });
        });

        Self { state }
    }

    pub fn publish(&self, model: &OverlayModel) -> Result<()> {
        let mut guard = self.state.write().unwrap();
        *guard = model.clone();
        println!(
            "[overlay] phase {:?}, instruction: {}",
            guard.phase, guard.instruction
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[overlay] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> OverlayModel {
        self.state.read().unwrap().clone()
    }
}

async fn ingest_frame(
    submission: &FrameSubmission,
    runner: &ScanRunner,
    fetcher: Arc<dyn ProductFetcher>,
) -> &'static str {
    let detection = submission.code_bounds.map(|bounds| DetectedCode {
        payload: CodePayload {
            format: submission.format.unwrap_or_default(),
            text: submission.code_text.clone().unwrap_or_default(),
        },
        bounds,
    });
    let decoder = InlineDecoder { detection };
    let packet = FramePacket {
        image_width: submission.image_width,
        image_height: submission.image_height,
        rotation_degrees: submission.rotation_degrees,
        handle: FrameHandle(0),
    };

    match runner.process_frame(&packet, &decoder) {
        FrameDisposition::Dropped => "dropped",
        FrameDisposition::Suppressed => "suppressed",
        FrameDisposition::Analyzed(transition) => {
            for effect in transition.effects {
                if let SideEffect::BeginFetch(payload) = effect {
                    let fetcher = fetcher.clone();
                    if let Ok(result) =
                        tokio::task::spawn_blocking(move || fetcher.fetch(&payload)).await
                    {
                        runner.complete_fetch(result);
                    }
                }
            }
            "ok"
        }
    }
}
