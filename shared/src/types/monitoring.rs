//! Request monitoring types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SessionId;

/// Lifecycle status of a monitored request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Success,
    Error,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// One inbound request as seen by a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub method: String,
    pub path: String,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestLog {
    pub fn matches_session(&self, filter: Option<&SessionId>) -> bool {
        match filter {
            Some(session_id) => self.session_id.as_ref() == Some(session_id),
            None => true,
        }
    }
}

/// Fields known when a request arrives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    pub session_id: Option<SessionId>,
    pub method: String,
    pub path: String,
    pub provider: Option<String>,
    pub model: Option<String>,
}

/// Partial update merged into a stored `RequestLog`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestUpdate {
    pub session_id: Option<SessionId>,
    pub status: Option<RequestStatus>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

/// Aggregate metrics for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub session_id: SessionId,
    pub start_time: DateTime<Utc>,
    pub request_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub average_response_time_ms: f64,
    pub error_count: u64,
    /// Successful requests that reported a duration (denominator of the mean)
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub last_request_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub providers: BTreeMap<String, u64>,
    #[serde(default)]
    pub models: BTreeMap<String, u64>,
}

impl SessionMetrics {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            start_time: Utc::now(),
            request_count: 0,
            total_input_tokens: 0,
            total_output_tokens: 0,
            average_response_time_ms: 0.0,
            error_count: 0,
            success_count: 0,
            last_request_time: None,
            providers: BTreeMap::new(),
            models: BTreeMap::new(),
        }
    }
}

/// Content of `monitoring/metrics.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsFile {
    pub sessions: Vec<SessionMetrics>,
    pub last_updated: DateTime<Utc>,
}

/// Token usage block of an upstream response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, alias = "prompt_tokens")]
    pub input_tokens: u64,
    #[serde(default, alias = "completion_tokens")]
    pub output_tokens: u64,
}

/// The only parts of a worker response the monitor looks at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponse {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl WorkerResponse {
    /// Extract from a JSON body, ignoring every unrelated field
    pub fn from_json_bytes(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RequestStatus::Pending).unwrap(), "\"pending\"");
        assert!(RequestStatus::Success.is_terminal());
        assert!(RequestStatus::Error.is_terminal());
        assert!(!RequestStatus::Pending.is_terminal());
    }

    #[test]
    fn test_worker_response_accepts_both_usage_styles() {
        let anthropic = br#"{"id":"msg_1","model":"claude-3","usage":{"input_tokens":12,"output_tokens":34}}"#;
        let parsed = WorkerResponse::from_json_bytes(anthropic).unwrap();
        assert_eq!(parsed.model.as_deref(), Some("claude-3"));
        assert_eq!(parsed.usage, Some(TokenUsage { input_tokens: 12, output_tokens: 34 }));

        let openai = br#"{"model":"gpt-4","usage":{"prompt_tokens":5,"completion_tokens":7,"total_tokens":12}}"#;
        let parsed = WorkerResponse::from_json_bytes(openai).unwrap();
        assert_eq!(parsed.usage, Some(TokenUsage { input_tokens: 5, output_tokens: 7 }));

        assert!(WorkerResponse::from_json_bytes(b"not json").is_none());
    }
}
