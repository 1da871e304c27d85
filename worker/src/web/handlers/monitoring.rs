//! Monitoring read and reset endpoints

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Json;

use shared::{ApiResponse, LogsQuery, RequestLog, ResetMetricsRequest, SessionFilterQuery, SessionId, SessionMetrics};

use crate::error::{WorkerError, WorkerResult};
use crate::state::AppState;

/// Logs returned when no limit is given
pub const DEFAULT_LOG_LIMIT: usize = 100;

pub async fn get_logs(
    State(state): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> WorkerResult<Json<Vec<RequestLog>>> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    Ok(Json(state.monitor.recent_logs(query.session_id.as_ref(), limit).await))
}

pub async fn clear_logs(
    State(state): State<AppState>,
    query: Result<Query<SessionFilterQuery>, QueryRejection>,
) -> WorkerResult<Json<ApiResponse>> {
    let Query(query) = query?;
    let removed = state.monitor.clear_logs(query.session_id.as_ref()).await;
    Ok(Json(ApiResponse::ok(format!("Cleared {removed} logs"))))
}

pub async fn get_metrics(
    State(state): State<AppState>,
    query: Result<Query<SessionFilterQuery>, QueryRejection>,
) -> WorkerResult<Json<Vec<SessionMetrics>>> {
    let Query(query) = query?;
    Ok(Json(state.monitor.metrics(query.session_id.as_ref()).await))
}

/// Reset one session, or every session when the body is empty
///
/// The body is parsed as JSON whatever its content type; a body that does
/// not parse is rejected rather than widening the reset to all sessions.
pub async fn reset_metrics(State(state): State<AppState>, body: Bytes) -> WorkerResult<Json<ApiResponse>> {
    let session_id = parse_reset_body(&body)?;
    let removed = state.monitor.reset_metrics(session_id.as_ref()).await;
    Ok(Json(ApiResponse::ok(format!("Reset metrics for {removed} sessions"))))
}

fn parse_reset_body(body: &[u8]) -> WorkerResult<Option<SessionId>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: ResetMetricsRequest = serde_json::from_slice(body)
        .map_err(|e| WorkerError::invalid(format!("Malformed reset body: {e}")))?;
    Ok(request.session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reset_body() {
        assert_eq!(parse_reset_body(b"").unwrap(), None);
        assert_eq!(parse_reset_body(b"  \n").unwrap(), None);
        assert_eq!(parse_reset_body(b"{}").unwrap(), None);
        assert_eq!(
            parse_reset_body(br#"{"sessionId":"aaaa0000"}"#).unwrap(),
            Some(SessionId::new("aaaa0000"))
        );
        assert!(parse_reset_body(br#"{"sessionId":"#).is_err());
    }
}
