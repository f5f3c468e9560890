//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest scope identifier accepted.
pub const MAX_SCOPE_LEN: usize = 64;

/// Validates a scope identifier: 1 to 64 ASCII letters, digits, `_` or `-`.
///
/// # Examples
///
/// ```ignore
/// validate_scope("sky_wars")  // Ok
/// validate_scope("sky wars")  // Err - space
/// validate_scope("")          // Err - empty
/// ```
pub fn validate_scope(scope: &str) -> Result<(), ValidationError> {
    if scope.is_empty() || scope.len() > MAX_SCOPE_LEN {
        let mut err = ValidationError::new("scope_length");
        err.message = Some(
            format!(
                "Scope must be between 1 and {MAX_SCOPE_LEN} characters (got {})",
                scope.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !scope
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        let mut err = ValidationError::new("scope_format");
        err.message = Some("Scope must contain only ASCII letters, digits, `_` or `-`".into());
        return Err(err);
    }

    Ok(())
}
