pub mod fetch;
pub mod frame;

pub use fetch::{ProductFetcher, ProductInfo};
pub use frame::{DecodeOracle, FrameHandle, FramePacket, FrameSource};
