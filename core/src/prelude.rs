use crate::geometry::rect::RectF;
use serde::{Deserialize, Serialize};

/// Symbology of a decoded barcode, as reported by the external decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeFormat {
    Ean8,
    Ean13,
    UpcA,
    Code39,
    Code128,
    QrCode,
    DataMatrix,
    Unknown,
}

impl Default for CodeFormat {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Opaque decoded payload; the core never interprets the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePayload {
    pub format: CodeFormat,
    pub text: String,
}

/// A code found by the decoder, with bounds in decoder image space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedCode {
    pub payload: CodePayload,
    pub bounds: RectF,
}

/// A detected code whose bounds have been mapped into screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedCode {
    pub payload: CodePayload,
    pub bounds: RectF,
}

/// Common error type for the scanning core and its collaborators.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),
    #[error("decode failure: {0}")]
    DecodeFailure(String),
    #[error("decode cancelled")]
    DecodeCancelled,
    #[error("fetch failure: {0}")]
    FetchFailure(String),
}

pub type ScanResult<T> = Result<T, ScanError>;
