//! Common test utilities and infrastructure
//!
//! Shared fixtures and the mock-backed coordinator builder used by the
//! integration suite.

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{CoordinatorBuilder, TestCoordinator};
