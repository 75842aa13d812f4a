pub mod bridge;
pub mod model;

pub use bridge::OverlayBridge;
pub use model::{FrameSubmission, LayoutUpdate, OverlayModel};
