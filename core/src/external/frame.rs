use crate::prelude::{DetectedCode, ScanResult};
use serde::{Deserialize, Serialize};

/// Opaque ticket for one delivered camera frame. The consumer must hand it
/// back to `FrameSource::release` exactly once, on every path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// One available camera frame in the sensor's native orientation.
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub image_width: u32,
    pub image_height: u32,
    pub rotation_degrees: i32,
    pub handle: FrameHandle,
}

/// Upstream frame acquisition. Frames arrive at the camera rate; holding a
/// handle past `release` starves the source.
pub trait FrameSource: Send {
    fn poll_frame(&mut self) -> Option<FramePacket>;
    fn release(&mut self, handle: FrameHandle);
}

/// The external barcode decoder, treated as an oracle. Empty results,
/// cancellation, and failure all count as "no code this frame".
pub trait DecodeOracle: Send + Sync {
    fn decode(&self, handle: FrameHandle) -> ScanResult<Vec<DetectedCode>>;
}
