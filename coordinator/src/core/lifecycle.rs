//! Per-session lifecycle state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session is in its start/stop cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    NotRunning,
    Starting,
    Running,
    Stopping,
}

/// Inputs driving `SessionState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    SpawnRequested,
    BecameReady,
    ReadyTimedOut,
    StopRequested,
    Exited,
}

impl SessionState {
    /// Next state, or `None` when the event is not valid here
    pub fn transition(self, event: LifecycleEvent) -> Option<SessionState> {
        use LifecycleEvent::*;
        use SessionState::*;

        match (self, event) {
            (NotRunning, SpawnRequested) => Some(Starting),
            (Starting, BecameReady) => Some(Running),
            (Starting, ReadyTimedOut) => Some(NotRunning),
            (Starting, StopRequested) | (Running, StopRequested) => Some(Stopping),
            (Stopping, Exited) | (Running, Exited) => Some(NotRunning),
            _ => None,
        }
    }

    /// Observed state from liveness alone
    pub fn observed(alive: bool) -> SessionState {
        if alive {
            SessionState::Running
        } else {
            SessionState::NotRunning
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::NotRunning => "not running",
            SessionState::Starting => "starting",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let state = SessionState::NotRunning;
        let state = state.transition(LifecycleEvent::SpawnRequested).unwrap();
        assert_eq!(state, SessionState::Starting);
        let state = state.transition(LifecycleEvent::BecameReady).unwrap();
        assert_eq!(state, SessionState::Running);
        let state = state.transition(LifecycleEvent::StopRequested).unwrap();
        assert_eq!(state, SessionState::Stopping);
        let state = state.transition(LifecycleEvent::Exited).unwrap();
        assert_eq!(state, SessionState::NotRunning);
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        assert_eq!(SessionState::NotRunning.transition(LifecycleEvent::BecameReady), None);
        assert_eq!(SessionState::Running.transition(LifecycleEvent::SpawnRequested), None);
        assert_eq!(
            SessionState::Starting.transition(LifecycleEvent::ReadyTimedOut),
            Some(SessionState::NotRunning)
        );
    }
}
