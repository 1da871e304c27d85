//! Message types exchanged by the session router processes
//!
//! - `monitor`: MonitoringService events and subscriber stream frames
//! - `api`: JSON bodies of the worker HTTP API

pub mod api;
pub mod monitor;

pub use api::{
    ApiResponse, LogsQuery, ResetMetricsRequest, SessionFilterQuery, SessionSummary,
    StartSessionRequest, StartSessionResponse,
};

pub use monitor::{MonitorEvent, StreamFrame};
