//! Process signalling
//!
//! Thin wrapper over `kill(2)` translating errno into the coordinator's
//! error taxonomy: ESRCH is `ProcessAbsent`, EPERM is `PermissionDenied`.

use crate::error::{CoordinatorError, CoordinatorResult};

/// Signals the coordinator sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Terminate,
    Kill,
}

#[cfg(unix)]
mod imp {
    use super::*;
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    fn map_errno(pid: i32, errno: Errno) -> CoordinatorError {
        match errno {
            Errno::ESRCH => CoordinatorError::ProcessAbsent { pid },
            Errno::EPERM => CoordinatorError::PermissionDenied { pid },
            other => CoordinatorError::SignalFailed { pid, message: other.to_string() },
        }
    }

    pub fn send(pid: i32, sig: StopSignal) -> CoordinatorResult<()> {
        if pid <= 0 {
            // kill(0|-n) would target a process group
            return Err(CoordinatorError::ProcessAbsent { pid });
        }
        let signal = match sig {
            StopSignal::Terminate => Signal::SIGTERM,
            StopSignal::Kill => Signal::SIGKILL,
        };
        signal::kill(Pid::from_raw(pid), signal).map_err(|e| map_errno(pid, e))
    }

    pub fn probe(pid: i32) -> CoordinatorResult<bool> {
        if pid <= 0 {
            return Ok(false);
        }
        match signal::kill(Pid::from_raw(pid), None) {
            Ok(()) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            // Exists but belongs to someone else
            Err(Errno::EPERM) => Ok(true),
            Err(e) => Err(map_errno(pid, e)),
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use super::*;

    pub fn send(pid: i32, _sig: StopSignal) -> CoordinatorResult<()> {
        Err(CoordinatorError::SignalFailed {
            pid,
            message: "signals are only supported on unix".to_string(),
        })
    }

    pub fn probe(_pid: i32) -> CoordinatorResult<bool> {
        Ok(false)
    }
}

/// Deliver `sig` to `pid`
pub fn send_signal(pid: i32, sig: StopSignal) -> CoordinatorResult<()> {
    imp::send(pid, sig)
}

/// Zero-signal existence probe
pub fn process_exists(pid: i32) -> CoordinatorResult<bool> {
    imp::probe(pid)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Above any default pid_max
    const ABSENT_PID: i32 = i32::MAX - 1;

    #[test]
    fn test_probe_own_process() {
        assert!(process_exists(std::process::id() as i32).unwrap());
    }

    #[test]
    fn test_probe_absent_process() {
        assert!(!process_exists(ABSENT_PID).unwrap());
        assert!(!process_exists(0).unwrap());
    }

    #[test]
    fn test_signal_absent_process_maps_to_process_absent() {
        let result = send_signal(ABSENT_PID, StopSignal::Terminate);
        assert!(matches!(result, Err(CoordinatorError::ProcessAbsent { pid }) if pid == ABSENT_PID));
    }
}
