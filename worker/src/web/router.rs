//! Route table

use axum::routing::{any, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use crate::web::handlers::{health, monitoring, proxy, sessions, stream};

/// Build the Axum router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Session control
        .route("/api/sessions", get(sessions::list_sessions))
        .route("/api/sessions/start", post(sessions::start_session))
        .route("/api/sessions/:session_id/stop", post(sessions::stop_session))
        // Monitoring
        .route(
            "/api/monitoring/logs",
            get(monitoring::get_logs).delete(monitoring::clear_logs),
        )
        .route("/api/monitoring/metrics", get(monitoring::get_metrics))
        .route("/api/monitoring/metrics/reset", post(monitoring::reset_metrics))
        .route("/api/monitoring/stream", get(stream::stream_handler))
        // Forwarded model API
        .route("/v1/*path", any(proxy::forward))
        // Health check
        .route("/health", get(health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}
