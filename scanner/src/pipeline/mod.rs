pub mod config;
pub mod fetch;
pub mod runner;

pub use config::ScannerConfig;
pub use runner::{drive_feed, FrameDisposition, RunReport, ScanRunner};
