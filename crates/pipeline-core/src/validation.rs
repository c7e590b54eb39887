//! Validation utilities.

use crate::PipelineError;
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `PipelineError` on failure.
    fn validate_request(&self) -> Result<(), PipelineError> {
        self.validate().map_err(validation_errors_to_pipeline_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Converts `validator::ValidationErrors` to `PipelineError`.
#[must_use]
pub fn validation_errors_to_pipeline_error(errors: ValidationErrors) -> PipelineError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let detail = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), |m| m.to_string());
                format!("{field}: {detail}")
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    PipelineError::Validation(message)
}

/// Common validation functions shared by the job payload and config layers.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates that a content hash looks like a hex digest.
    pub fn valid_content_hash(hash: &str) -> Result<(), ValidationError> {
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::new("invalid_content_hash"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_valid_content_hash() {
        assert!(valid_content_hash("deadbeef").is_ok());
        assert!(valid_content_hash("").is_err());
        assert!(valid_content_hash("not-hex!").is_err());
    }
}
