//! Worker library for one model router session
//!
//! A worker serves a single session's port: it forwards model API calls to
//! the upstream while recording each one in the `MonitoringService`, and it
//! exposes session control and monitoring over HTTP and WebSocket.

pub mod config;
pub mod core;
pub mod error;
pub mod server;
pub mod services;
pub mod state;
pub mod traits;
pub mod web;

// Re-export main types
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use server::WorkerServer;
pub use state::{AppState, WorkerIdentity};
pub use web::build_router;

// Re-export trait definitions
pub use traits::{
    ForwardRequest, ForwardResponse, Forwarder, MockForwarder, MockMonitorStore, MockSessionControl, MonitorStore,
    SessionControl,
};

// Re-export service implementations
pub use services::{FileMonitorStore, HttpForwarder, MonitoringService};
