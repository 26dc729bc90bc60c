//! Desk error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("You don't have permission to do that.")]
    NotAuthenticated,

    #[error("You don't have access to do that.")]
    NotAuthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please verify your email address before logging in. Check your inbox for the verification email.")]
    EmailNotVerified,

    #[error("An account with that email already exists")]
    DuplicateAccount,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("{0}")]
    ValidationError(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DeskError::ValidationError(msg.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        DeskError::Internal(err.to_string())
    }
}

impl From<studiodesk_core::Error> for DeskError {
    fn from(err: studiodesk_core::Error) -> Self {
        use studiodesk_core::Error;

        match err {
            Error::NotAuthenticated => DeskError::NotAuthenticated,
            Error::NotAuthorized => DeskError::NotAuthorized,
            other => DeskError::ValidationError(other.to_string()),
        }
    }
}

impl IntoResponse for DeskError {
    fn into_response(self) -> Response {
        let status = match &self {
            DeskError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            DeskError::NotAuthorized => StatusCode::FORBIDDEN,
            DeskError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            DeskError::EmailNotVerified => StatusCode::FORBIDDEN,
            DeskError::DuplicateAccount => StatusCode::CONFLICT,
            DeskError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            DeskError::ValidationError(_) => StatusCode::BAD_REQUEST,
            DeskError::NotFound(_) => StatusCode::NOT_FOUND,
            DeskError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            DeskError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = json!({ "success": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}
