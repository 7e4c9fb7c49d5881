//! Structured error handling for HTTP services.
//!
//! Adapters return [`AppError`]. Handlers turn it into an [`ApiError`] that
//! carries the HTTP status and the client-facing message. Internal details are
//! logged but never sent to clients.

use std::borrow::Cow;
use std::fmt::Display;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application error type shared by all crates.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Convert into an HTTP error.
    ///
    /// Client-facing variants keep their message. `Unavailable` and
    /// `Internal` are logged and replaced by `internal_message`.
    #[must_use]
    pub fn into_api_error(self, internal_message: &'static str) -> ApiError {
        match self {
            Self::NotFound(msg) => ApiError::not_found(msg),
            Self::PermissionDenied(msg) => ApiError::forbidden(msg),
            Self::InvalidArgument(msg) => ApiError::bad_request(msg),
            Self::Unavailable(msg) | Self::Internal(msg) => {
                error!(error = %msg, "{internal_message}");
                ApiError::internal(internal_message)
            }
        }
    }
}

/// HTTP error with a JSON body of the form `{"message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: Cow<'static, str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[inline]
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

/// Extension trait for converting arbitrary errors into [`AppError::Internal`] with logging.
pub trait InternalExt<T> {
    /// Log the error and map it to `AppError::Internal`.
    fn internal(self, msg: &'static str) -> Result<T, AppError>;
}

impl<T, E: Display> InternalExt<T> for Result<T, E> {
    fn internal(self, msg: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            error!(error = %e, "{msg}");
            AppError::Internal(format!("{msg}: {e}"))
        })
    }
}

/// Extension trait for Option types.
pub trait OptionExt<T> {
    /// Convert `None` to [`AppError::NotFound`].
    fn ok_or_not_found(self, msg: &'static str) -> Result<T, AppError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: &'static str) -> Result<T, AppError> {
        self.ok_or_else(|| AppError::NotFound(msg.to_string()))
    }
}
