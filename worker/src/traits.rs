//! Service trait definitions for dependency injection
//!
//! Persistence, upstream forwarding and session control are abstracted so
//! the monitoring service and the HTTP handlers can be tested with mocks.

use async_trait::async_trait;

use coordinator::{StartOutcome, StopOutcome};
use shared::{RequestLog, SessionId, SessionMetrics, SessionSummary};

use crate::error::WorkerResult;

/// Durable storage behind the monitoring service
#[mockall::automock]
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Persisted metrics; a missing or corrupt file yields an empty list
    async fn load_metrics(&self) -> WorkerResult<Vec<SessionMetrics>>;

    /// Overwrite the metrics file with the full map
    async fn save_metrics(&self, metrics: &[SessionMetrics]) -> WorkerResult<()>;

    /// Append entries to the per-day request logs, one JSON object per line
    async fn append_logs(&self, logs: &[RequestLog]) -> WorkerResult<()>;
}

/// Request as handed to the upstream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardRequest {
    pub method: String,
    /// Path plus query string, e.g. `/v1/messages?beta=true`
    pub path_and_query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Upstream reply relayed back to the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ForwardResponse {
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Relays `/v1/*` requests to the configured upstream
#[mockall::automock]
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> WorkerResult<ForwardResponse>;
}

/// Session operations exposed over HTTP
#[mockall::automock]
#[async_trait]
pub trait SessionControl: Send + Sync {
    async fn list(&self) -> Vec<SessionSummary>;

    async fn start(&self, preference: &str) -> WorkerResult<StartOutcome>;

    async fn stop(&self, session_id: &SessionId) -> WorkerResult<StopOutcome>;
}
