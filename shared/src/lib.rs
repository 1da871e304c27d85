//! Shared types for the model router session system
//!
//! Contains the data model persisted on disk and exchanged between the
//! coordinator and worker processes, plus the common logging setup.

pub mod env;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{
    // Monitoring stream
    MonitorEvent, StreamFrame,

    // Worker HTTP API bodies
    ApiResponse, LogsQuery, ResetMetricsRequest, SessionFilterQuery, SessionSummary,
    StartSessionRequest, StartSessionResponse,
};
