//! Coordinator-specific error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use shared::{SessionId, SharedError};

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("No free port in range {start}..={end}")]
    PortExhausted { start: u16, end: u16 },

    #[error("Process {pid} no longer exists")]
    ProcessAbsent { pid: i32 },

    #[error("Permission denied signalling process {pid}")]
    PermissionDenied { pid: i32 },

    #[error("Stale pid file: {path}")]
    StalePidFile { path: PathBuf },

    #[error("Unknown session: {session_id}")]
    SessionNotFound { session_id: SessionId },

    #[error("Failed to spawn worker for session {session_id}: {message}")]
    SpawnFailed { session_id: SessionId, message: String },

    #[error("Worker for session {session_id} did not become ready within {timeout:?}")]
    WorkerNotReady { session_id: SessionId, timeout: Duration },

    #[error("Signal delivery to {pid} failed: {message}")]
    SignalFailed { pid: i32, message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoordinatorError {
    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }

    /// Hint printed by the CLI next to a fatal error
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::PortExhausted { .. } => {
                "free a port in the range or set MODEL_ROUTER_BASE_PORT to a different start port"
            }
            Self::PermissionDenied { .. } => {
                "the worker belongs to another user; stop it as that user or with elevated privileges"
            }
            Self::SpawnFailed { .. } => {
                "check that the worker binary exists or set MODEL_ROUTER_WORKER_BIN to its path"
            }
            Self::WorkerNotReady { .. } => {
                "inspect the worker log in the session's logs directory"
            }
            Self::SessionNotFound { .. } => "run `coordinator list` to see known sessions",
            _ => "re-run with MODEL_ROUTER_LOG=debug for details",
        }
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
