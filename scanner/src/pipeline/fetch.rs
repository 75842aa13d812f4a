use scancore::external::fetch::{ProductFetcher, ProductInfo};
use scancore::prelude::{CodePayload, ScanError, ScanResult};
use std::thread;
use std::time::Duration;

/// Stand-in for the product-information backend: sleeps for the configured
/// delay and answers with canned information. Runs on a blocking task.
pub struct MockFetchService {
    delay: Duration,
    fail: bool,
}

impl MockFetchService {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            fail: false,
        }
    }

    pub fn failing(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            fail: true,
        }
    }
}

impl ProductFetcher for MockFetchService {
    fn fetch(&self, payload: &CodePayload) -> ScanResult<ProductInfo> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if self.fail {
            return Err(ScanError::FetchFailure("mock backend refused".to_string()));
        }
        Ok(ProductInfo {
            title: format!("Product {}", payload.text),
            description: "This is mock information fetched from server".to_string(),
        })
    }
}
