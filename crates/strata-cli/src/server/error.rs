//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use strata::StrataError;

/// API error type, carrying the request id it was raised under.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Copy)]
pub enum ApiErrorKind {
    /// Bad request from the client.
    BadRequest,
    /// Engine or request deadline exceeded.
    Timeout,
    /// Internal server error.
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest,
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    pub fn timeout(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Timeout,
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    pub fn internal(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Internal,
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    /// Map an engine error onto the HTTP contract: validation-class errors
    /// become 400s, timeouts and everything else 500s.
    pub fn from_engine(error: StrataError, request_id: &str) -> Self {
        match error {
            StrataError::Validation(_)
            | StrataError::Parse(_)
            | StrataError::InvalidDelimiter(_)
            | StrataError::EmptyData(_)
            | StrataError::Csv(_) => Self::bad_request(error.to_string(), request_id),
            StrataError::Timeout(_) => Self::timeout(error.to_string(), request_id),
            other => {
                tracing::error!(error = %other, request_id, "internal error");
                Self::internal("Internal server error", request_id)
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: String,
    request_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.kind {
            ApiErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorKind::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.message,
                request_id: self.request_id,
            }),
        )
            .into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}
