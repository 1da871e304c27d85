//! Coordinator library for per-preference model router sessions
//!
//! Maps a model preference to a stable session id, keeps one detached worker
//! process alive per session, and tracks sessions through a shared on-disk
//! registry so that independent CLI invocations agree on what is running.

pub mod config;
pub mod coordinator;
pub mod core;
pub mod error;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, ReleaseOutcome, SessionStatus, StartOutcome};
pub use crate::core::{derive_session_id, parse_preference, LifecycleEvent, SessionState};
pub use error::{CoordinatorError, CoordinatorResult};
pub use services::{FileSessionRegistry, PortAllocator, RealProcessManager};
pub use traits::{MockProcessLifecycle, MockSessionRegistry, ProcessLifecycle, SessionRegistry, StopOutcome};
