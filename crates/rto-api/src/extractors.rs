//! # Custom Extractors
//!
//! Validated JSON body extraction. Handlers take
//! `Result<Json<T>, JsonRejection>` and pass it through
//! [`extract_validated_json`], which normalizes deserialization failures
//! and business validation failures into one 422 shape.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request payloads that carry their own field-level checks, run after
/// deserialization and before the handler touches state.
pub trait Validate {
    /// Check field-level constraints. The message becomes the 422 body.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON extraction, then run payload validation.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(payload) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    payload.validate().map_err(AppError::Validation)?;
    Ok(payload)
}
