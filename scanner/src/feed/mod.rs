pub mod script;
pub mod source;

pub use script::{approach_script, FrameAction, ScanScript};
pub use source::{ScriptedDecoder, SyntheticFeed};
