//! Upstream forwarding over HTTP
//!
//! Relays a request verbatim to `<upstream><path_and_query>`. Routing rules
//! and request rewriting are not applied here.

use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};
use crate::traits::{ForwardRequest, ForwardResponse, Forwarder};
use shared::{process_debug, ProcessId};

/// Upper bound for one upstream exchange, model responses can be slow
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(600);

/// Headers that describe the inbound connection rather than the request
const HOP_HEADERS: &[&str] = &["host", "content-length", "connection", "transfer-encoding"];

#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
    upstream_url: Option<String>,
}

impl HttpForwarder {
    pub fn new(upstream_url: Option<String>) -> WorkerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(|e| WorkerError::config(format!("HTTP client: {e}")))?;
        Ok(Self { client, upstream_url })
    }

    pub fn upstream_url(&self) -> Option<&str> {
        self.upstream_url.as_deref()
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ForwardRequest) -> WorkerResult<ForwardResponse> {
        let upstream = self.upstream_url.as_deref().ok_or(WorkerError::UpstreamNotConfigured)?;
        let url = format!("{upstream}{}", request.path_and_query);
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| WorkerError::invalid(format!("unsupported method {}", request.method)))?;

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            if !HOP_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        process_debug!(ProcessId::current(), "➡️ {} {}", request.method, url);
        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| WorkerError::UpstreamFailed { message: e.to_string() })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| WorkerError::UpstreamFailed { message: e.to_string() })?
            .to_vec();

        Ok(ForwardResponse { status, content_type, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_without_upstream_is_not_configured() {
        let forwarder = HttpForwarder::new(None).unwrap();
        let result = forwarder
            .forward(ForwardRequest {
                method: "POST".to_string(),
                path_and_query: "/v1/messages".to_string(),
                ..ForwardRequest::default()
            })
            .await;
        assert!(matches!(result, Err(WorkerError::UpstreamNotConfigured)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_fails() {
        // Port 9 (discard) is closed on test hosts
        let forwarder = HttpForwarder::new(Some("http://127.0.0.1:9".to_string())).unwrap();
        let result = forwarder
            .forward(ForwardRequest {
                method: "GET".to_string(),
                path_and_query: "/v1/models".to_string(),
                ..ForwardRequest::default()
            })
            .await;
        assert!(matches!(result, Err(WorkerError::UpstreamFailed { .. })));
    }
}
