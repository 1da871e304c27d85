//! Service-specific tests
//!
//! Each service has its own test file. Everything runs against a throwaway
//! home directory so tests never touch `~/.model-router`.

#[cfg(test)]
mod process_management;

// Common test utilities for services
#[cfg(test)]
pub mod common {
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::config::CoordinatorConfig;
    use crate::services::process_manager::RealProcessManager;
    use crate::services::session_registry::FileSessionRegistry;

    /// Pid that no real process will have
    pub const ABSENT_PID: u32 = (i32::MAX - 1) as u32;

    /// Short timings so process tests stay fast
    pub const TEST_GRACE: Duration = Duration::from_millis(200);

    /// Fresh home directory with a registry rooted in it
    pub fn temp_registry() -> (TempDir, FileSessionRegistry) {
        let home = TempDir::new().expect("temp dir");
        let registry = FileSessionRegistry::new(home.path());
        (home, registry)
    }

    /// Process manager over a fresh registry with fast settle and grace
    pub fn temp_manager(home: &TempDir) -> (Arc<FileSessionRegistry>, RealProcessManager<FileSessionRegistry>) {
        let registry = Arc::new(FileSessionRegistry::new(home.path()));
        let config = CoordinatorConfig::with_home(home.path());
        let manager = RealProcessManager::new(Arc::clone(&registry), &config)
            .with_settle_delay(Duration::ZERO)
            .with_stop_grace(TEST_GRACE);
        (registry, manager)
    }
}
