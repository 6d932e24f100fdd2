use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Every failure on the search path. None of them is recovered locally; all
/// reach the caller as a plain-text 500.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unsupported search method: {0}")]
    UnsupportedMethod(String),

    #[error("Search failed: {0:#}")]
    Upstream(#[from] anyhow::Error),

    #[error("Search worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::MalformedRequest(e.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        log::error!("{:#}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
