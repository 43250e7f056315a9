//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a player identity field (student or college name) carries a value.
///
/// # Examples
///
/// ```ignore
/// validate_identity_field("Alice")  // Ok
/// validate_identity_field("   ")    // Err - blank
/// ```
pub fn validate_identity_field(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("identity_blank");
        err.message = Some("Field must not be blank".into());
        return Err(err);
    }

    Ok(())
}

/// Error recorded when a required field is absent from the payload.
pub fn missing_field() -> ValidationError {
    let mut err = ValidationError::new("required");
    err.message = Some("Field is required".into());
    err
}
