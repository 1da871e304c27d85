//! Monitored forwarding of `/v1/*`
//!
//! Every request is wrapped in `start_request` / `end_request`, whatever the
//! upstream does.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use shared::WorkerResponse;

use crate::state::AppState;
use crate::traits::ForwardRequest;

pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let meta = state.identity.request_meta(method.as_str(), uri.path());
    let request_id = state.monitor.start_request(meta).await;

    let request = ForwardRequest {
        method: method.to_string(),
        path_and_query: uri.path_and_query().map(|pq| pq.as_str().to_string()).unwrap_or_else(|| uri.path().to_string()),
        headers: headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect(),
        body: body.to_vec(),
    };

    match state.forwarder.forward(request).await {
        Ok(upstream) => {
            let parsed = WorkerResponse::from_json_bytes(&upstream.body);
            let error = (!upstream.is_success()).then(|| format!("upstream returned {}", upstream.status));
            state.monitor.end_request(&request_id, parsed.as_ref(), error).await;

            let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut response = (status, upstream.body).into_response();
            if let Some(content_type) = upstream.content_type.and_then(|ct| ct.parse::<HeaderValue>().ok()) {
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            }
            response
        }
        Err(e) => {
            state.monitor.end_request(&request_id, None, Some(e.to_string())).await;
            e.into_response()
        }
    }
}
