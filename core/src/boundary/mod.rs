pub mod classifier;
pub mod state;

pub use classifier::{BoundaryClassifier, ClassifierConfig, ScanVerdict};
pub use state::{BoundarySnapshot, BoundaryState};
