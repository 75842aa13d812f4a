use crate::pipeline::config::ScannerConfig;
use anyhow::Context;
use log::info;
use scancore::boundary::classifier::BoundaryClassifier;
use scancore::boundary::state::BoundaryState;
use scancore::external::fetch::ProductFetcher;
use scancore::external::frame::{DecodeOracle, FramePacket, FrameSource};
use scancore::geometry::rect::RectF;
use scancore::geometry::transform::FrameTransform;
use scancore::prelude::{ScanError, TransformedCode};
use scancore::session::controller::{SessionController, SessionPhase, SessionTransition};
use scancore::session::events::{LifecycleEvent, ResultPanelState, SideEffect};
use scancore::telemetry::log::LogManager;
use scancore::telemetry::metrics::{MetricsRecorder, MetricsSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// What happened to one delivered frame.
#[derive(Debug)]
pub enum FrameDisposition {
    /// A frame was already in analysis; this one was dropped, not queued.
    Dropped,
    /// A committed result is being surfaced; analysis short-circuited.
    Suppressed,
    Analyzed(SessionTransition),
}

/// Serializes the transform → classify → fold pipeline for one session.
///
/// Analysis is single-flight: a frame arriving while another is in analysis
/// is rejected up front. Verdict folding, fetch completion, and dismissal
/// all go through the controller mutex, so no two transitions interleave.
pub struct ScanRunner {
    boundaries: Arc<BoundaryState>,
    classifier: BoundaryClassifier,
    controller: Mutex<SessionController>,
    in_flight: AtomicBool,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl ScanRunner {
    pub fn new(config: &ScannerConfig, boundaries: Arc<BoundaryState>) -> Self {
        Self {
            boundaries,
            classifier: BoundaryClassifier::new(config.to_classifier_config()),
            controller: Mutex::new(SessionController::new()),
            in_flight: AtomicBool::new(false),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new(),
        }
    }

    /// Analyzes one frame. The caller still owns the frame handle and must
    /// release it to the source afterwards, whatever the disposition.
    pub fn process_frame(&self, packet: &FramePacket, decoder: &dyn DecodeOracle) -> FrameDisposition {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            self.metrics.record_dropped();
            return FrameDisposition::Dropped;
        }
        let disposition = self.analyze(packet, decoder);
        self.in_flight.store(false, Ordering::Release);
        disposition
    }

    fn analyze(&self, packet: &FramePacket, decoder: &dyn DecodeOracle) -> FrameDisposition {
        if self.lock_controller().suppressed() {
            return FrameDisposition::Suppressed;
        }

        // Decode failure and cancellation downgrade to "no code this frame".
        let detected = match decoder.decode(packet.handle) {
            Ok(codes) => codes.into_iter().next(),
            Err(ScanError::DecodeCancelled) => None,
            Err(err) => {
                self.metrics.record_decode_error();
                self.logger.alert(&format!("decoder failed: {err}"));
                None
            }
        };

        let snapshot = self.boundaries.snapshot();
        let transformed = detected.and_then(|code| {
            FrameTransform::compute(
                packet.image_width,
                packet.image_height,
                packet.rotation_degrees,
                &snapshot.viewport,
            )
            .ok()
            .map(|transform| TransformedCode {
                bounds: transform.apply(&code.bounds),
                payload: code.payload,
            })
        });

        let verdict = self.classifier.classify(transformed, &snapshot);
        let transition = self.lock_controller().fold_verdict(verdict);
        if matches!(transition.event, Some(LifecycleEvent::Committed(_))) {
            self.metrics.record_commit();
        }
        self.metrics.record_processed();
        FrameDisposition::Analyzed(transition)
    }

    pub fn complete_fetch(
        &self,
        result: scancore::ScanResult<scancore::external::fetch::ProductInfo>,
    ) -> SessionTransition {
        self.lock_controller().complete_fetch(result)
    }

    pub fn dismiss(&self) -> SessionTransition {
        self.lock_controller().dismiss()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock_controller().phase()
    }

    pub fn instruction(&self) -> &'static str {
        self.lock_controller().instruction()
    }

    pub fn panel(&self) -> ResultPanelState {
        self.lock_controller().panel().clone()
    }

    pub fn active_bounds(&self) -> Option<RectF> {
        self.lock_controller().active_code().map(|code| code.bounds)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn lock_controller(&self) -> MutexGuard<'_, SessionController> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Summary of one driven feed.
#[derive(Debug)]
pub struct RunReport {
    pub frames_delivered: usize,
    pub events: Vec<LifecycleEvent>,
    pub metrics: MetricsSnapshot,
}

/// Drains a frame source through the runner, performing the side effects a
/// real presentation layer would own: freeze/resume logging, the fetch call
/// (on a blocking task), and optionally the user's dismissal.
pub async fn drive_feed<S: FrameSource>(
    runner: &ScanRunner,
    source: &mut S,
    decoder: &dyn DecodeOracle,
    fetcher: Arc<dyn ProductFetcher>,
    frame_interval: Duration,
    auto_dismiss: bool,
) -> anyhow::Result<RunReport> {
    let mut frames_delivered = 0;
    let mut events = Vec::new();

    while let Some(packet) = source.poll_frame() {
        frames_delivered += 1;
        let disposition = runner.process_frame(&packet, decoder);
        source.release(packet.handle);

        if let FrameDisposition::Analyzed(transition) = disposition {
            apply_transition(runner, transition, &fetcher, &mut events, auto_dismiss).await?;
        }

        if !frame_interval.is_zero() {
            tokio::time::sleep(frame_interval).await;
        }
    }

    Ok(RunReport {
        frames_delivered,
        events,
        metrics: runner.metrics(),
    })
}

async fn apply_transition(
    runner: &ScanRunner,
    transition: SessionTransition,
    fetcher: &Arc<dyn ProductFetcher>,
    events: &mut Vec<LifecycleEvent>,
    auto_dismiss: bool,
) -> anyhow::Result<()> {
    if let Some(event) = transition.event {
        info!("lifecycle: {:?}", event);
        events.push(event);
    }

    for effect in transition.effects {
        match effect {
            SideEffect::FreezeCamera => info!("camera preview frozen"),
            SideEffect::ResumeCamera => info!("camera preview resumed"),
            SideEffect::BeginFetch(payload) => {
                let fetcher = fetcher.clone();
                let result = tokio::task::spawn_blocking(move || fetcher.fetch(&payload))
                    .await
                    .context("joining product fetch task")?;
                let fetched = runner.complete_fetch(result);
                if let Some(event) = fetched.event {
                    info!("lifecycle: {:?}", event);
                    events.push(event);
                }
                if auto_dismiss {
                    let dismissed = runner.dismiss();
                    if let Some(event) = dismissed.event {
                        events.push(event);
                    }
                    if dismissed.effects.contains(&SideEffect::ResumeCamera) {
                        info!("camera preview resumed");
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::script::approach_script;
    use crate::feed::source::{ScriptedDecoder, SyntheticFeed};
    use crate::pipeline::fetch::MockFetchService;
    use scancore::external::frame::FrameHandle;
    use scancore::prelude::{CodeFormat, CodePayload, DetectedCode, ScanResult};
    use std::sync::mpsc;
    use std::thread;

    fn test_config() -> ScannerConfig {
        ScannerConfig {
            frames: 24,
            frame_interval_ms: 0,
            fetch_delay_ms: 0,
            ..Default::default()
        }
    }

    fn runner_for(config: &ScannerConfig) -> ScanRunner {
        let boundaries = Arc::new(BoundaryState::new());
        boundaries.set_viewport(config.viewport);
        boundaries.set_scanning_window(config.window());
        ScanRunner::new(config, boundaries)
    }

    fn perfect_frame_decoder(config: &ScannerConfig) -> ScriptedDecoder {
        // A single code filling most of the scanning window on every frame.
        let window = config.window();
        let inset_x = window.width() * 0.02;
        let inset_y = window.height() * 0.02;
        ScriptedDecoder::fixed(DetectedCode {
            payload: CodePayload {
                format: CodeFormat::Ean13,
                text: "4006381333931".to_string(),
            },
            bounds: RectF::new(
                window.left + inset_x,
                window.top + inset_y,
                window.right - inset_x,
                window.bottom - inset_y,
            ),
        })
    }

    #[tokio::test]
    async fn scripted_approach_commits_exactly_once_without_dismissal() {
        let config = test_config();
        let runner = runner_for(&config);
        let mut source = SyntheticFeed::new(&config);
        let decoder = ScriptedDecoder::new(approach_script(&config));
        let fetcher: Arc<dyn ProductFetcher> = Arc::new(MockFetchService::new(0));

        let report = drive_feed(
            &runner,
            &mut source,
            &decoder,
            fetcher,
            Duration::ZERO,
            false,
        )
        .await
        .unwrap();

        let commits = report
            .events
            .iter()
            .filter(|event| matches!(event, LifecycleEvent::Committed(_)))
            .count();
        assert_eq!(commits, 1);
        assert_eq!(report.metrics.commits, 1);
        assert_eq!(runner.phase(), SessionPhase::Committed);
        assert!(matches!(runner.panel(), ResultPanelState::Expanded { .. }));
        assert_eq!(source.outstanding(), 0);
        assert_eq!(source.released(), report.frames_delivered);
    }

    #[tokio::test]
    async fn auto_dismiss_returns_the_session_to_idle() {
        let config = test_config();
        let runner = runner_for(&config);
        let mut source = SyntheticFeed::new(&config);
        let decoder = ScriptedDecoder::new(approach_script(&config));
        let fetcher: Arc<dyn ProductFetcher> = Arc::new(MockFetchService::new(0));

        let report = drive_feed(&runner, &mut source, &decoder, fetcher, Duration::ZERO, true)
            .await
            .unwrap();

        assert!(report.metrics.commits >= 1);
        assert_eq!(runner.phase(), SessionPhase::Idle);
        assert_eq!(runner.panel(), ResultPanelState::Hidden);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_committed_error() {
        let config = test_config();
        let runner = runner_for(&config);
        let mut source = SyntheticFeed::new(&config);
        let decoder = perfect_frame_decoder(&config);
        let fetcher: Arc<dyn ProductFetcher> = Arc::new(MockFetchService::failing(0));

        let report = drive_feed(
            &runner,
            &mut source,
            &decoder,
            fetcher,
            Duration::ZERO,
            false,
        )
        .await
        .unwrap();

        assert!(report.events.contains(&LifecycleEvent::CommittedError));
        assert_eq!(runner.phase(), SessionPhase::CommittedError);

        let dismissed = runner.dismiss();
        assert!(dismissed.effects.contains(&SideEffect::ResumeCamera));
        assert_eq!(runner.phase(), SessionPhase::Idle);
    }

    #[test]
    fn decode_failure_downgrades_to_no_detection() {
        struct FailingDecoder;
        impl DecodeOracle for FailingDecoder {
            fn decode(&self, _handle: FrameHandle) -> ScanResult<Vec<DetectedCode>> {
                Err(ScanError::DecodeFailure("sensor glitch".to_string()))
            }
        }

        let config = test_config();
        let runner = runner_for(&config);
        let packet = FramePacket {
            image_width: config.image_width,
            image_height: config.image_height,
            rotation_degrees: config.rotation_degrees,
            handle: FrameHandle(0),
        };

        let disposition = runner.process_frame(&packet, &FailingDecoder);
        match disposition {
            FrameDisposition::Analyzed(transition) => {
                assert!(matches!(
                    transition.event,
                    Some(LifecycleEvent::Idle { .. })
                ));
            }
            other => panic!("unexpected disposition {:?}", other),
        }
        assert_eq!(runner.metrics().decode_errors, 1);
        assert_eq!(runner.phase(), SessionPhase::Idle);
    }

    #[test]
    fn frames_are_suppressed_while_a_result_is_showing() {
        let config = test_config();
        let runner = runner_for(&config);
        let decoder = perfect_frame_decoder(&config);
        let packet = FramePacket {
            image_width: config.image_width,
            image_height: config.image_height,
            rotation_degrees: config.rotation_degrees,
            handle: FrameHandle(0),
        };

        assert!(matches!(
            runner.process_frame(&packet, &decoder),
            FrameDisposition::Analyzed(_)
        ));
        assert_eq!(runner.phase(), SessionPhase::Committed);
        assert!(matches!(
            runner.process_frame(&packet, &decoder),
            FrameDisposition::Suppressed
        ));
    }

    #[test]
    fn concurrent_frame_is_dropped_not_queued() {
        // Decoder that parks inside the analysis until told to resume, so a
        // second submission observes the single-flight guard.
        struct ParkingDecoder {
            entered: mpsc::Sender<()>,
            resume: Mutex<mpsc::Receiver<()>>,
        }
        impl DecodeOracle for ParkingDecoder {
            fn decode(&self, _handle: FrameHandle) -> ScanResult<Vec<DetectedCode>> {
                self.entered.send(()).ok();
                if let Ok(receiver) = self.resume.lock() {
                    receiver.recv().ok();
                }
                Ok(Vec::new())
            }
        }

        let config = test_config();
        let runner = Arc::new(runner_for(&config));
        let (entered_tx, entered_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let decoder = Arc::new(ParkingDecoder {
            entered: entered_tx,
            resume: Mutex::new(resume_rx),
        });
        let packet = FramePacket {
            image_width: config.image_width,
            image_height: config.image_height,
            rotation_degrees: config.rotation_degrees,
            handle: FrameHandle(7),
        };

        let worker = {
            let runner = runner.clone();
            let decoder = decoder.clone();
            let packet = packet.clone();
            thread::spawn(move || runner.process_frame(&packet, decoder.as_ref()))
        };

        entered_rx.recv().unwrap();
        assert!(matches!(
            runner.process_frame(&packet, decoder.as_ref()),
            FrameDisposition::Dropped
        ));
        resume_tx.send(()).unwrap();
        assert!(matches!(
            worker.join().unwrap(),
            FrameDisposition::Analyzed(_)
        ));
        assert_eq!(runner.metrics().frames_dropped, 1);
    }
}
