//! Worker-specific error types

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use coordinator::CoordinatorError;
use shared::{ApiResponse, SharedError};

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("HTTP server startup failed on port {port}: {message}")]
    ServerStartupFailed { port: u16, message: String },

    #[error("Invalid request: {details}")]
    InvalidRequest { details: String },

    #[error("No upstream configured for forwarding")]
    UpstreamNotConfigured,

    #[error("Upstream request failed: {message}")]
    UpstreamFailed { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }

    pub fn invalid(details: impl Into<String>) -> Self {
        Self::InvalidRequest { details: details.into() }
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::UpstreamNotConfigured | Self::UpstreamFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::Coordinator(CoordinatorError::SessionNotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Coordinator(CoordinatorError::PermissionDenied { .. }) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Extractor failures are reported in the same JSON envelope as handler errors
impl From<JsonRejection> for WorkerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for WorkerError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ApiResponse::failed(self.to_string()))).into_response()
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;
