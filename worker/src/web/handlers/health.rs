use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let identity = &state.identity;
    Json(json!({
        "status": "healthy",
        "sessionId": identity.session_id,
        "port": identity.port,
        "uptimeSeconds": identity.started_at.elapsed().as_secs(),
        "subscribers": state.monitor.subscriber_count(),
    }))
}
