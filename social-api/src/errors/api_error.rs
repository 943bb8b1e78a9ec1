//! HTTP error mapping.
//!
//! Every failure leaves a handler as `{"detail": "<message>"}` with a status
//! derived from the domain error kind. Storage failures are logged and their
//! details withheld from the client.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use social_service::{ErrorKind, SocialError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Social(#[from] SocialError),

    /// Malformed request parameters caught before reaching the service.
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Social(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict | ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Auth => match err {
                    SocialError::Forbidden(_) => StatusCode::FORBIDDEN,
                    _ => StatusCode::UNAUTHORIZED,
                },
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            "Internal server error.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
