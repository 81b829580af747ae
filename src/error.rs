//! Error types shared by the drivers and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors that can occur while serving a dashboard request.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Query parameters could not be interpreted.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The requested region has no data.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream answered with a non-success status.
    #[error("Upstream {url} returned {status}")]
    Upstream { url: String, status: u16 },

    /// Upstream did not answer within the configured timeout.
    #[error("Upstream {url} timed out")]
    UpstreamTimeout { url: String },

    /// Transport-level failure talking to an upstream.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream payload did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Upstream CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The cache store rejected an operation.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A cached blob or chart could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Local configuration or data files are unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

impl From<redis::RedisError> for DashboardError {
    fn from(err: redis::RedisError) -> Self {
        DashboardError::Cache(err.to_string())
    }
}

impl DashboardError {
    /// HTTP status reported to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::Upstream { .. }
            | DashboardError::Http(_)
            | DashboardError::Decode(_)
            | DashboardError::Csv(_) => StatusCode::BAD_GATEWAY,
            DashboardError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            DashboardError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::Serialize(_) | DashboardError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
