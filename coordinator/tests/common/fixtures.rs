//! Test fixtures and data for coordinator tests

use chrono::{TimeZone, Utc};
use std::path::Path;

use coordinator::derive_session_id;
use shared::{SessionDescriptor, SessionPaths};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const PREFERENCE: &'static str = "openrouter,anthropic/claude-3.5-sonnet";
    pub const OTHER_PREFERENCE: &'static str = "deepseek/deepseek-chat";
    pub const SESSIONS_ROOT: &'static str = "/tmp/model-router-tests/sessions";
    pub const PORT: u16 = 3460;
    pub const PID: u32 = 4242;

    /// Descriptor as the registry would return it, optionally with a port
    pub fn descriptor(preference: &str, port: Option<u16>) -> SessionDescriptor {
        let session_id = derive_session_id(preference);
        let parts = coordinator::parse_preference(preference);
        SessionDescriptor {
            preference: preference.to_string(),
            paths: SessionPaths::new(Path::new(Self::SESSIONS_ROOT), &session_id),
            session_id,
            provider: parts.provider,
            model: parts.model,
            port,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    /// Descriptor for `PREFERENCE` that has already been assigned `PORT`
    pub fn running_descriptor() -> SessionDescriptor {
        Self::descriptor(Self::PREFERENCE, Some(Self::PORT))
    }

    /// Descriptor for `PREFERENCE` that has never been started
    pub fn fresh_descriptor() -> SessionDescriptor {
        Self::descriptor(Self::PREFERENCE, None)
    }
}
