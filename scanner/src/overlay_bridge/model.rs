use crate::pipeline::runner::ScanRunner;
use scancore::geometry::rect::RectF;
use scancore::prelude::CodeFormat;
use scancore::session::controller::SessionPhase;
use scancore::session::events::INSTRUCTION_POINT_CAMERA;
use scancore::telemetry::metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// What the overlay renderer needs to draw one frame of UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayModel {
    pub phase: SessionPhase,
    pub instruction: String,
    pub code_bounds: Option<RectF>,
    pub panel: String,
    pub metrics: MetricsSnapshot,
}

impl OverlayModel {
    pub fn from_runner(runner: &ScanRunner) -> Self {
        Self {
            phase: runner.phase(),
            instruction: runner.instruction().to_string(),
            code_bounds: runner.active_bounds(),
            panel: runner.panel().label().to_string(),
            metrics: runner.metrics(),
        }
    }
}

impl Default for OverlayModel {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            instruction: INSTRUCTION_POINT_CAMERA.to_string(),
            code_bounds: None,
            panel: "hidden".to_string(),
            metrics: MetricsSnapshot::default(),
        }
    }
}

/// Layout pass payload: both reference rectangles in screen space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutUpdate {
    pub viewport: RectF,
    pub scanning_window: RectF,
}

/// One externally injected frame observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSubmission {
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub rotation_degrees: i32,
    #[serde(default)]
    pub code_bounds: Option<RectF>,
    #[serde(default)]
    pub code_text: Option<String>,
    #[serde(default)]
    pub format: Option<CodeFormat>,
}
