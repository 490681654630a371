//! Validation helpers for DTOs.

use std::borrow::Cow;

use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::dao::models::Difficulty;

/// Validates that a difficulty is one of `Easy`, `Normal` or `Hard`.
pub fn validate_difficulty(value: &str) -> Result<(), ValidationError> {
    value.parse::<Difficulty>().map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("difficulty");
        error.message = Some(err.to_string().into());
        error
    })
}

/// Validates that a reference to another record is a well-formed identifier.
pub fn validate_record_id(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value).map(|_| ()).map_err(|_| {
        let mut error = ValidationError::new("record_id");
        error.message = Some(format!("`{value}` is not a valid identifier").into());
        error
    })
}

/// Rejects `NaN` and infinities, which have no JSON representation.
pub fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        let mut error = ValidationError::new("finite");
        error.message = Some(format!("`{value}` is not a finite number").into());
        Err(error)
    }
}

/// Record a `required` error for `field` when `value` is missing, and hand the value back.
pub fn require<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<T>,
) -> Option<T> {
    if value.is_none() {
        let mut error = ValidationError::new("required");
        error.message = Some(Cow::Owned(format!("{field} is required")));
        errors.add(field, error);
    }
    value
}
