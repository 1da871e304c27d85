//! Service tests for the worker
//!
//! Monitoring behaviour is tested against both a mocked store and the real
//! file store in a temporary directory.


// Common test utilities for services
#[cfg(test)]
pub mod common {
    use std::sync::Arc;

    use crate::services::monitoring::MonitoringService;
    use crate::traits::MockMonitorStore;
    use shared::{RequestMeta, SessionId};

    pub const SESSION_A: &str = "aaaa0000";
    pub const SESSION_B: &str = "bbbb1111";

    /// Store mock accepting every write
    pub fn permissive_store() -> MockMonitorStore {
        let mut store = MockMonitorStore::new();
        store.expect_load_metrics().returning(|| Ok(Vec::new()));
        store.expect_save_metrics().returning(|_| Ok(()));
        store.expect_append_logs().returning(|_| Ok(()));
        store
    }

    pub fn service_with(store: MockMonitorStore) -> MonitoringService {
        MonitoringService::new(Arc::new(store))
    }

    pub fn meta(session: &str) -> RequestMeta {
        RequestMeta {
            session_id: Some(SessionId::new(session)),
            method: "POST".to_string(),
            path: "/v1/messages".to_string(),
            provider: Some("openrouter".to_string()),
            model: None,
        }
    }
}
