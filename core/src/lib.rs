//! Boundary-analysis core for the camera barcode scanner.
//!
//! The modules cover the frame transform, the reference-rectangle state,
//! the relevance classifier, and the scan-session lifecycle, with the
//! frame source, decoder, and fetch collaborators kept behind interfaces.

pub mod boundary;
pub mod external;
pub mod geometry;
pub mod prelude;
pub mod session;
pub mod telemetry;

pub use prelude::{CodePayload, DetectedCode, ScanError, ScanResult, TransformedCode};
