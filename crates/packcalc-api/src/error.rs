//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`PackError`] kinds, request rejections and storage failures to HTTP
//! status codes and a JSON body carrying `success: false`, a human-readable
//! `errorMessage` and a machine-readable error code. Internal error details
//! are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use packcalc_core::PackError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

/// Message returned in place of any internal error.
pub const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    pub error_message: String,
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "INVALID_PACK_SIZE", "RATE_LIMITED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Offending value or limit, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        let message = message.into();
        Self {
            success: false,
            error_message: message.clone(),
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        }
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Domain rejection from the pack engine.
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Request body could not be parsed (422).
    #[error("invalid request: {0}")]
    Validation(String),

    /// Too many requests from one client (429).
    #[error("rate limit exceeded")]
    RateLimited,

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Pack(PackError::EmptySet) => (StatusCode::CONFLICT, PackError::EmptySet.kind()),
            Self::Pack(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.kind()),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Message safe to show to clients.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Pack(PackError::InvalidPackSize { value, .. })
            | Self::Pack(PackError::InvalidOrder { value, .. }) => Some(json!({ "value": value })),
            Self::Pack(PackError::TooManyPackSizes { count, limit }) => {
                Some(json!({ "count": count, "limit": limit }))
            }
            Self::Pack(PackError::SearchSpaceTooLarge { required, limit }) => {
                Some(json!({ "required": required.to_string(), "limit": limit }))
            }
            Self::Pack(PackError::Unreachable { order }) => Some(json!({ "order": order })),
            _ => None,
        }
    }

    /// Structured body for this error, with internal details stripped.
    pub fn body(&self) -> ErrorBody {
        let (_, code) = self.status_and_code();
        ErrorBody::new(code, self.public_message(), self.details())
    }

    /// Log server-side failures for operator visibility.
    pub fn log(&self) {
        if let Self::Internal(_) = self {
            tracing::error!(error = %self, "internal server error");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        self.log();
        (status, Json(self.body())).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database: {err}"))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("optimizer task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_conflict() {
        let (status, code) = AppError::from(PackError::EmptySet).status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "EMPTY_SET");
    }

    #[test]
    fn invalid_inputs_are_unprocessable() {
        for err in [
            PackError::InvalidPackSize {
                value: "0".into(),
                reason: "pack sizes must be positive".into(),
            },
            PackError::TooManyPackSizes { count: 17, limit: 16 },
            PackError::SearchSpaceTooLarge {
                required: 1 << 40,
                limit: 1 << 21,
            },
            PackError::InvalidOrder {
                value: "-1".into(),
                reason: "order quantity must not be negative".into(),
            },
            PackError::Unreachable { order: 7 },
        ] {
            let kind = err.kind();
            let (status, code) = AppError::from(err).status_and_code();
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(code, kind);
        }
    }

    #[test]
    fn rate_limited_status_code() {
        let (status, code) = AppError::RateLimited.status_and_code();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(code, "RATE_LIMITED");
    }

    #[test]
    fn body_carries_success_flag_and_message() {
        let body = AppError::from(PackError::EmptySet).body();
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["errorMessage"], "no pack sizes configured");
        assert_eq!(v["error"]["code"], "EMPTY_SET");
        assert!(v["error"].get("details").is_none());
    }

    #[test]
    fn details_include_offending_value() {
        let body = AppError::from(PackError::InvalidPackSize {
            value: "2.5".into(),
            reason: "pack sizes must be integers".into(),
        })
        .body();
        assert_eq!(body.error.details.unwrap()["value"], "2.5");
    }

    // ── into_response tests ──────────────────────────────────────

    use http_body_util::BodyExt;

    /// Helper to extract status and body from a Response.
    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn into_response_validation() {
        let (status, body) = response_parts(AppError::Validation("missing field".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert!(body.error_message.contains("missing field"));
        assert!(!body.success);
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(
            !body.error.message.contains("db connection"),
            "internal error details must not leak: {}",
            body.error.message
        );
        assert_eq!(body.error_message, INTERNAL_MESSAGE);
        assert!(body.error.details.is_none());
    }

    #[test]
    fn sqlx_errors_become_internal() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);
    }
}
