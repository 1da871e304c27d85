//! Coordinator configuration
//!
//! Values come from, in increasing priority: built-in defaults, a `.env`
//! file, the process environment, and CLI flags (applied by `main`).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CoordinatorError, CoordinatorResult};
use shared::env;

/// Default wall-clock limit for a worker to become live
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default grace before the first readiness poll
pub const DEFAULT_READY_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Name of the worker executable looked up next to the coordinator
pub const WORKER_BINARY_NAME: &str = "worker";

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    pub home_dir: PathBuf,
    pub base_port: u16,
    pub worker_program: PathBuf,
    pub ready_timeout: Duration,
    pub ready_initial_delay: Duration,
    pub log_level: String,
}

impl CoordinatorConfig {
    /// Defaults rooted at `home_dir`
    pub fn with_home(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            base_port: env::DEFAULT_BASE_PORT,
            worker_program: default_worker_program(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            ready_initial_delay: DEFAULT_READY_INITIAL_DELAY,
            log_level: "info".to_string(),
        }
    }

    /// Load `.env` and the environment on top of the defaults
    pub fn from_env() -> CoordinatorResult<Self> {
        dotenv::dotenv().ok();

        let home_dir = match std::env::var(env::HOME) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_home_dir()?,
        };
        let mut config = Self::with_home(home_dir);

        if let Ok(raw) = std::env::var(env::BASE_PORT) {
            config.base_port = raw
                .trim()
                .parse()
                .map_err(|_| CoordinatorError::config(format!("{}={raw} is not a port", env::BASE_PORT)))?;
        }
        if let Ok(program) = std::env::var(env::WORKER_BIN) {
            config.worker_program = PathBuf::from(program);
        }
        if let Ok(level) = std::env::var(env::LOG_LEVEL) {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Configure the readiness timing (fluent API)
    pub fn with_ready_timing(mut self, timeout: Duration, initial_delay: Duration) -> Self {
        self.ready_timeout = timeout;
        self.ready_initial_delay = initial_delay;
        self
    }
}

/// `~/.model-router`
pub fn default_home_dir() -> CoordinatorResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".model-router"))
        .ok_or_else(|| CoordinatorError::config(format!("no home directory; set {}", env::HOME)))
}

/// The `worker` binary installed alongside the current executable
fn default_worker_program() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(WORKER_BINARY_NAME)))
        .unwrap_or_else(|| PathBuf::from(WORKER_BINARY_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_rooted_at_home() {
        let config = CoordinatorConfig::with_home("/tmp/router-home");
        assert_eq!(config.home_dir, PathBuf::from("/tmp/router-home"));
        assert_eq!(config.base_port, 3456);
        assert_eq!(config.ready_timeout, Duration::from_secs(10));
        assert!(config.worker_program.ends_with(WORKER_BINARY_NAME));
    }

    #[test]
    fn test_ready_timing_override() {
        let config = CoordinatorConfig::with_home("/tmp/x")
            .with_ready_timing(Duration::from_millis(300), Duration::ZERO);
        assert_eq!(config.ready_timeout, Duration::from_millis(300));
        assert_eq!(config.ready_initial_delay, Duration::ZERO);
    }
}
