//! Test data shared by the HTTP suite

use shared::{SessionId, SessionSummary};
use worker::ForwardResponse;

pub struct TestFixtures;

impl TestFixtures {
    pub const SESSION_ID: &'static str = "9f86d081";
    pub const OTHER_SESSION_ID: &'static str = "60303ae2";
    pub const PORT: u16 = 3461;
    pub const PREFERENCE: &'static str = "openrouter,anthropic/claude-3-haiku";

    pub fn session_id() -> SessionId {
        SessionId::new(Self::SESSION_ID)
    }

    pub fn summary() -> SessionSummary {
        SessionSummary {
            session_id: Self::session_id(),
            preference: Self::PREFERENCE.to_string(),
            provider: Some("openrouter".to_string()),
            model: Some("anthropic/claude-3-haiku".to_string()),
            port: Some(Self::PORT),
            alive: true,
            pid: Some(4242),
            reference_count: 2,
        }
    }

    /// Anthropic-style completion with token usage
    pub fn upstream_success() -> ForwardResponse {
        let body = serde_json::json!({
            "id": "msg_01",
            "type": "message",
            "model": "anthropic/claude-3-haiku",
            "usage": {"input_tokens": 21, "output_tokens": 8},
        });
        ForwardResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    pub fn upstream_rate_limited() -> ForwardResponse {
        ForwardResponse {
            status: 429,
            content_type: Some("application/json".to_string()),
            body: br#"{"error":{"type":"rate_limit_error"}}"#.to_vec(),
        }
    }
}
