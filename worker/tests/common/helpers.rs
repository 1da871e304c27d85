//! Builder for routers over mocked services

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceExt;

use super::fixtures::TestFixtures;
use worker::{AppState, MockForwarder, MockMonitorStore, MockSessionControl, MonitoringService, WorkerIdentity};

/// Router plus the monitoring service behind it
pub struct TestApp {
    pub router: Router,
    pub monitor: Arc<MonitoringService>,
}

/// Builder for test apps with sensible defaults
pub struct AppBuilder {
    sessions: MockSessionControl,
    forwarder: MockForwarder,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            sessions: MockSessionControl::new(),
            forwarder: MockForwarder::new(),
        }
    }

    /// Configure the session control mock with a setup function
    pub fn with_sessions<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockSessionControl),
    {
        setup(&mut self.sessions);
        self
    }

    /// Configure the forwarder mock with a setup function
    pub fn with_forwarder<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockForwarder),
    {
        setup(&mut self.forwarder);
        self
    }

    pub fn build(self) -> TestApp {
        let mut store = MockMonitorStore::new();
        store.expect_load_metrics().returning(|| Ok(Vec::new()));
        store.expect_save_metrics().returning(|_| Ok(()));
        store.expect_append_logs().returning(|_| Ok(()));

        let monitor = Arc::new(MonitoringService::new(Arc::new(store)));
        let identity = WorkerIdentity {
            session_id: TestFixtures::session_id(),
            provider: Some("openrouter".to_string()),
            model: Some("anthropic/claude-3-haiku".to_string()),
            port: TestFixtures::PORT,
            started_at: Instant::now(),
        };
        let state = AppState::new(
            Arc::clone(&monitor),
            Arc::new(self.sessions),
            Arc::new(self.forwarder),
            identity,
        );

        TestApp {
            router: worker::build_router(state),
            monitor,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one request through the router and decode the JSON body
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
