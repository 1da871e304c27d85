//! Worker configuration
//!
//! A spawned worker receives everything through `MODEL_ROUTER_*` variables;
//! the same values can be given as flags when a worker is run by hand.

use std::path::{Path, PathBuf};

use coordinator::{derive_session_id, parse_preference};
use shared::{env, SessionId, SessionPaths};

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub home_dir: PathBuf,
    pub preference: String,
    pub session_id: SessionId,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Pre-assigned port; probed from the base port when absent
    pub port: Option<u16>,
    pub upstream_url: Option<String>,
    pub log_level: String,
}

impl WorkerConfig {
    /// Derive identity from `preference` under `home_dir`
    pub fn new(home_dir: impl Into<PathBuf>, preference: impl Into<String>) -> Self {
        let preference = preference.into();
        let parts = parse_preference(&preference);
        Self {
            home_dir: home_dir.into(),
            session_id: derive_session_id(&preference),
            provider: parts.provider,
            model: parts.model,
            preference,
            port: None,
            upstream_url: None,
            log_level: "info".to_string(),
        }
    }

    /// Configure the port (fluent API)
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Configure the upstream base URL (fluent API); blank means none
    pub fn with_upstream(mut self, upstream_url: Option<String>) -> Self {
        self.upstream_url = upstream_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        self
    }

    /// Apply coordinator-provided identity overrides from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(id) = std::env::var(env::SESSION_ID) {
            if !id.trim().is_empty() {
                self.session_id = SessionId::new(id.trim());
            }
        }
        if let Ok(provider) = std::env::var(env::PROVIDER) {
            self.provider = Some(provider);
        }
        if let Ok(model) = std::env::var(env::MODEL) {
            self.model = Some(model);
        }
        self
    }

    pub fn sessions_root(&self) -> PathBuf {
        self.home_dir.join(env::SESSIONS_DIR)
    }

    pub fn session_paths(&self) -> SessionPaths {
        SessionPaths::new(&self.sessions_root(), &self.session_id)
    }

    pub fn monitoring_dir(&self) -> PathBuf {
        self.home_dir.join(env::MONITORING_DIR)
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }
}
