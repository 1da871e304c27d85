//! Builder pattern for creating coordinators over mocked services
//!
//! Defaults make every read succeed with "nothing running" so each test only
//! configures the calls it is about.

use std::sync::Arc;
use std::time::Duration;

use coordinator::{Coordinator, CoordinatorConfig, MockProcessLifecycle, MockSessionRegistry};

/// Type alias for a coordinator with both services mocked
pub type TestCoordinator = Coordinator<MockSessionRegistry, MockProcessLifecycle>;

/// Builder for test coordinators with sensible defaults
pub struct CoordinatorBuilder {
    registry: MockSessionRegistry,
    lifecycle: MockProcessLifecycle,
    ready_timeout: Duration,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            registry: MockSessionRegistry::new(),
            lifecycle: MockProcessLifecycle::new(),
            ready_timeout: Duration::from_millis(50),
        }
    }

    /// Configure the registry mock with a setup function
    pub fn with_registry<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockSessionRegistry),
    {
        setup(&mut self.registry);
        self
    }

    /// Configure the lifecycle mock with a setup function
    pub fn with_lifecycle<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockProcessLifecycle),
    {
        setup(&mut self.lifecycle);
        self
    }

    /// Default lookups used by `status` once the interesting calls are set up
    pub fn with_status_defaults(self) -> Self {
        self.with_registry(|registry| {
            registry.expect_read_pid().returning(|_| Some(super::TestFixtures::PID as i32));
            registry.expect_reference_count().returning(|_| 0);
        })
    }

    pub fn build(self) -> TestCoordinator {
        let config = CoordinatorConfig::with_home("/tmp/model-router-tests")
            .with_ready_timing(self.ready_timeout, Duration::ZERO);
        Coordinator::new(Arc::new(self.registry), Arc::new(self.lifecycle), &config)
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
