use crate::external::fetch::ProductInfo;
use crate::prelude::{CodePayload, TransformedCode};

pub const INSTRUCTION_POINT_CAMERA: &str = "Point your camera at a barcode";
pub const INSTRUCTION_MOVE_INTO_FRAME: &str =
    "Move your camera to place the barcode in the frame";
pub const INSTRUCTION_MOVE_CLOSER: &str = "Move closer to the barcode";
pub const INSTRUCTION_LOADING: &str = "Loading the result";
pub const INSTRUCTION_ERROR: &str = "Something went wrong, close the result to retry";

/// Externally observable scan lifecycle, one event per folded verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Idle { instruction: &'static str },
    Tracking { instruction: &'static str },
    Committed(TransformedCode),
    CommittedError,
}

/// One-time actions the presentation layer must perform on a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    FreezeCamera,
    ResumeCamera,
    BeginFetch(CodePayload),
}

/// State of the result surface shown after a commit.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultPanelState {
    #[default]
    Hidden,
    Loading {
        code: TransformedCode,
    },
    Expanded {
        code: TransformedCode,
        info: ProductInfo,
    },
    Error,
}

impl ResultPanelState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Loading { .. } => "loading",
            Self::Expanded { .. } => "expanded",
            Self::Error => "error",
        }
    }
}
