pub mod rect;
pub mod transform;

pub use rect::RectF;
pub use transform::{FrameTransform, Rotation};
