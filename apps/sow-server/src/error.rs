//! API error taxonomy and its HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sow_storage::StoreError;
use thiserror::Error;

/// Why a signing link cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    Invalid,
    Used,
    Expired,
}

impl LinkRejection {
    pub fn state(self) -> &'static str {
        match self {
            LinkRejection::Invalid => "invalid",
            LinkRejection::Used => "used",
            LinkRejection::Expired => "expired",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            LinkRejection::Invalid => "Invalid link",
            LinkRejection::Used => "This link has already been used",
            LinkRejection::Expired => "This link has expired",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            LinkRejection::Invalid => StatusCode::NOT_FOUND,
            LinkRejection::Used | LinkRejection::Expired => StatusCode::GONE,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{}", .0.message())]
    Link(LinkRejection),

    #[error("{0}")]
    Conflict(String),

    /// The detail is logged, never returned to the caller.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Link(rejection) => rejection.status(),
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a store error raised while resolving a signing token.
    pub fn from_token_error(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::Link(LinkRejection::Invalid),
            other => other.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("Statement of work not found".to_string()),
            StoreError::TokenUsed => ApiError::Link(LinkRejection::Used),
            StoreError::TokenExpired => ApiError::Link(LinkRejection::Expired),
            StoreError::Conflict => {
                ApiError::Conflict("Statement of work is already completed".to_string())
            }
            StoreError::AlreadyExists => ApiError::Internal("signing token collision".to_string()),
            StoreError::Backend(detail) => ApiError::Internal(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                json!({ "error": self.to_string() })
            }
            ApiError::Link(rejection) => json!({
                "state": rejection.state(),
                "error": rejection.message(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
