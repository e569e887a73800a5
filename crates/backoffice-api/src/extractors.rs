//! # Request Extraction & Validation
//!
//! The [`Validate`] trait for request DTOs and helpers that turn JSON
//! rejections into [`AppError::BadRequest`].

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;

use crate::error::AppError;

/// Request types with shape rules beyond what serde checks.
pub trait Validate {
    /// Validate the request. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to
/// [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract path parameters, mapping a malformed segment to
/// [`AppError::BadRequest`].
pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe(bool);

    impl Validate for Probe {
        fn validate(&self) -> Result<(), String> {
            if self.0 {
                Ok(())
            } else {
                Err("rejected by validate".into())
            }
        }
    }

    #[test]
    fn validated_json_passes_valid_values() {
        assert!(extract_validated_json(Ok(Json(Probe(true)))).is_ok());
    }

    #[test]
    fn validated_json_maps_failures_to_validation() {
        match extract_validated_json(Ok(Json(Probe(false)))) {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "rejected by validate"),
            Err(other) => panic!("expected Validation, got {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }
}
