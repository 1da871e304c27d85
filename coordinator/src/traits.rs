//! Trait definitions with mockall annotations for testing
//!
//! Every cross-process read-modify-write on the session tree is a named
//! method here, so callers resolve them at compile time and tests can swap in
//! mocks to inject race timing.

use std::time::Duration;

use shared::{SessionDescriptor, SessionId};

use crate::error::CoordinatorResult;

/// How a stop request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Process exited within the grace window after SIGTERM
    Terminated,
    /// Process survived SIGTERM and was sent SIGKILL
    Killed,
    /// No pid file, or the recorded process no longer existed
    AlreadyStopped,
}

impl StopOutcome {
    pub fn message(self) -> &'static str {
        match self {
            StopOutcome::Terminated => "Session stopped",
            StopOutcome::Killed => "Session force-killed after grace period",
            StopOutcome::AlreadyStopped => "Session already stopped",
        }
    }
}

/// On-disk session registry shared by every process on the host
///
/// None of these operations lock: concurrent writers from other processes
/// are last-writer-wins, and reference-count updates can be lost.
#[mockall::automock]
#[async_trait::async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Resolve a preference to its descriptor, reading any persisted port
    async fn get_or_create(&self, preference: &str) -> CoordinatorResult<SessionDescriptor>;

    /// Load a persisted descriptor by id
    async fn find(&self, session_id: &SessionId) -> Option<SessionDescriptor>;

    /// Overwrite the descriptor file
    async fn persist(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<()>;

    /// Whether the recorded pid refers to a live process; removes stale pid files
    async fn is_alive(&self, descriptor: &SessionDescriptor) -> bool;

    /// Recorded pid, if the pid file exists and parses
    async fn read_pid(&self, descriptor: &SessionDescriptor) -> Option<i32>;

    /// Every parseable descriptor on disk
    async fn list_all(&self) -> Vec<SessionDescriptor>;

    /// Descriptors whose worker is alive
    async fn list_active(&self) -> Vec<SessionDescriptor>;

    async fn record_pid(&self, descriptor: &SessionDescriptor, pid: u32) -> CoordinatorResult<()>;

    async fn clear_pid(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<()>;

    /// Current reference count, zero when missing or unreadable
    async fn reference_count(&self, descriptor: &SessionDescriptor) -> u64;

    async fn increment_reference_count(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<u64>;

    /// Decrement, floored at zero
    async fn decrement_reference_count(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<u64>;

    async fn clear_reference_count(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<()>;
}

/// Worker process lifecycle: spawn, readiness, signal-escalated stop
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProcessLifecycle: Send + Sync {
    /// Launch a detached worker, allocating and persisting a port first if needed
    ///
    /// Returns the spawned pid without waiting for readiness.
    async fn start(&self, descriptor: &mut SessionDescriptor) -> CoordinatorResult<u32>;

    /// Poll liveness until ready or `timeout` elapses; never errors
    async fn wait_until_ready(&self, descriptor: &SessionDescriptor, timeout: Duration, initial_delay: Duration) -> bool;

    /// SIGTERM, grace window, SIGKILL; always cleans up pid and reference files
    async fn stop(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<StopOutcome>;

    /// Best-effort stop followed by start
    async fn restart(&self, descriptor: &mut SessionDescriptor) -> CoordinatorResult<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_trait_instantiation() {
        let _registry = MockSessionRegistry::new();
        let _lifecycle = MockProcessLifecycle::new();
    }

    #[test]
    fn test_stop_outcome_messages() {
        assert_eq!(StopOutcome::AlreadyStopped.message(), "Session already stopped");
        assert_ne!(StopOutcome::Terminated.message(), StopOutcome::Killed.message());
    }
}
