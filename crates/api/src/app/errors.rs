use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use gatehouse_auth::{AuthError, ErrorCategory};
use gatehouse_infra::StoreError;

/// Error returned by handlers and middleware.
#[derive(Debug)]
pub enum ApiError {
    /// Authentication/authorization outcome from the pipeline or a guard.
    Auth(AuthError),

    /// Malformed request input (400).
    BadRequest(String),

    /// Requested record does not exist (404). Only used behind privileged guards.
    NotFound(&'static str),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Auth(AuthError::internal(err.to_string()))
    }
}

pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCategory::Forbidden => StatusCode::FORBIDDEN,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(err) => {
                let category = err.category();
                match &err {
                    AuthError::Internal(detail) => {
                        tracing::error!(%detail, "internal error during authorization")
                    }
                    other => tracing::debug!(code = other.code(), "request rejected"),
                }
                json_error(
                    status_for(category),
                    category.as_str(),
                    err.code(),
                    err.public_message(),
                )
            }
            ApiError::BadRequest(msg) => {
                json_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", "INVALID_REQUEST", msg)
            }
            ApiError::NotFound(what) => {
                json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "NOT_FOUND", what)
            }
        }
    }
}

pub fn json_error(
    status: StatusCode,
    category: &'static str,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": category,
            "code": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
