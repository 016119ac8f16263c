//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to extract a
//! JSON body and turn it into a validated domain value in handlers.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request types that carry loosely-typed JSON and convert into a checked
/// domain value.
pub trait Validate {
    type Output;

    /// Check business rules beyond what serde enforces and produce the value.
    fn validate(self) -> Result<Self::Output, AppError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::Validation`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T::Output, AppError> {
    extract_json(result)?.validate()
}
