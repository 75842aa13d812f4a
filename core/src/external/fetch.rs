use crate::prelude::{CodePayload, ScanResult};
use serde::{Deserialize, Serialize};

/// Information fetched for an accepted code, shown on the result surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub title: String,
    pub description: String,
}

/// Asynchronous collaborator invoked once per commit. The core performs no
/// retries; timeout policy belongs to the implementation.
pub trait ProductFetcher: Send + Sync {
    fn fetch(&self, payload: &CodePayload) -> ScanResult<ProductInfo>;
}
