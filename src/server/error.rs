//! HTTP error responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::HuginnError;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,

    /// The whole-request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Huginn(#[from] HuginnError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Huginn(HuginnError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Huginn(HuginnError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout | Self::Huginn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details never leave the process.
    fn public_message(&self) -> String {
        match self {
            Self::Huginn(HuginnError::Validation(msg)) => msg.clone(),
            Self::Huginn(HuginnError::RateLimited { .. }) => "Too many requests".to_string(),
            Self::MethodNotAllowed | Self::NotFound => self.to_string(),
            Self::Timeout | Self::Huginn(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        let mut response = (status, Json(body)).into_response();

        if let Self::Huginn(HuginnError::RateLimited { retry_after }) = &self {
            // Whole seconds, rounded up, never zero.
            let secs = retry_after
                .map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0))
                .unwrap_or(1)
                .max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
