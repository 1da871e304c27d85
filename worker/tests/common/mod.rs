//! Common test utilities and infrastructure
//!
//! Fixtures plus a builder that assembles the HTTP router over mocked
//! session control, a mocked forwarder and a real monitoring service.

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{send, AppBuilder, TestApp};
