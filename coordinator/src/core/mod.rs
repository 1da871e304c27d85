//! Core business logic modules
//!
//! Pure logic with no I/O: session identity and the lifecycle state machine.

pub mod identity;
pub mod lifecycle;

pub use identity::{derive_session_id, parse_preference};
pub use lifecycle::{LifecycleEvent, SessionState};
