//! Session control endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};

use coordinator::StartOutcome;
use shared::{process_info, ApiResponse, ProcessId, SessionId, SessionSummary, StartSessionRequest, StartSessionResponse};

use crate::error::WorkerResult;
use crate::state::AppState;

pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.sessions.list().await)
}

/// Start a session; an already running one is reported with `success: false`
pub async fn start_session(
    State(state): State<AppState>,
    request: Result<Json<StartSessionRequest>, JsonRejection>,
) -> WorkerResult<Response> {
    let Json(request) = request?;
    let outcome = state.sessions.start(&request.preference).await?;
    let response = match outcome {
        StartOutcome::Started { session_id, port, pid } => {
            process_info!(ProcessId::current(), "✅ Started session {} (PID: {}) via API", session_id, pid);
            Json(StartSessionResponse { success: true, session_id, port }).into_response()
        }
        StartOutcome::AlreadyRunning { session_id, port } => {
            Json(ApiResponse::failed(format!("Session {session_id} already running on port {port}"))).into_response()
        }
    };
    Ok(response)
}

/// Stop a session; 404 when unknown, "already stopped" when its process is gone
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> WorkerResult<Json<ApiResponse>> {
    let outcome = state.sessions.stop(&SessionId::new(session_id)).await?;
    Ok(Json(ApiResponse::ok(outcome.message())))
}
