//! Shared HTTP state
//!
//! Cloned into every handler; all services sit behind `Arc`.

use std::sync::Arc;
use std::time::Instant;

use shared::{RequestMeta, SessionId};

use crate::config::WorkerConfig;
use crate::services::monitoring::MonitoringService;
use crate::traits::{Forwarder, SessionControl};

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<MonitoringService>,
    pub sessions: Arc<dyn SessionControl>,
    pub forwarder: Arc<dyn Forwarder>,
    pub identity: Arc<WorkerIdentity>,
}

/// Which session this worker serves
#[derive(Debug, Clone)]
pub struct WorkerIdentity {
    pub session_id: SessionId,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub port: u16,
    pub started_at: Instant,
}

impl WorkerIdentity {
    pub fn from_config(config: &WorkerConfig, port: u16) -> Self {
        Self {
            session_id: config.session_id.clone(),
            provider: config.provider.clone(),
            model: config.model.clone(),
            port,
            started_at: Instant::now(),
        }
    }

    /// Monitoring metadata for an inbound request on this worker
    pub fn request_meta(&self, method: &str, path: &str) -> RequestMeta {
        RequestMeta {
            session_id: Some(self.session_id.clone()),
            method: method.to_string(),
            path: path.to_string(),
            provider: self.provider.clone(),
            model: self.model.clone(),
        }
    }
}

impl AppState {
    pub fn new(
        monitor: Arc<MonitoringService>,
        sessions: Arc<dyn SessionControl>,
        forwarder: Arc<dyn Forwarder>,
        identity: WorkerIdentity,
    ) -> Self {
        Self {
            monitor,
            sessions,
            forwarder,
            identity: Arc::new(identity),
        }
    }
}
