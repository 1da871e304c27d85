//! Core types used throughout the session router

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub mod monitoring;
pub mod session;

pub use monitoring::*;
pub use session::*;

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Fallback used before any `init_*` call (tests, library consumers)
static UNINITIALISED: ProcessId = ProcessId::Coordinator;

/// Process identifier for any component in the system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// Short-lived coordinator invocation (CLI)
    Coordinator,
    /// Long-running worker bound to one session
    Worker(SessionId),
}

impl ProcessId {
    /// Initialize the global process ID for the coordinator
    pub fn init_coordinator() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Coordinator)
    }

    /// Initialize the global process ID for a worker serving `session_id`
    pub fn init_worker(session_id: SessionId) -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Worker(session_id))
    }

    /// Get the global process ID, defaulting to the coordinator
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get().unwrap_or(&UNINITIALISED)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Coordinator => write!(f, "coordinator"),
            ProcessId::Worker(id) => write!(f, "worker_{id}"),
        }
    }
}

/// Stable short identifier of a session, derived from its model preference
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Identifier used for an empty preference
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn default_session() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_display() {
        let worker = ProcessId::Worker(SessionId::new("1a2b3c4d"));
        assert_eq!(worker.to_string(), "worker_1a2b3c4d");
        assert_eq!(ProcessId::Coordinator.to_string(), "coordinator");
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::new("deadbeef");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"deadbeef\"");
        let back: SessionId = serde_json::from_str("\"deadbeef\"").unwrap();
        assert_eq!(back, id);
    }
}
