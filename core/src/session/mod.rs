pub mod controller;
pub mod events;

pub use controller::{SessionController, SessionPhase, SessionTransition};
pub use events::{LifecycleEvent, ResultPanelState, SideEffect};
