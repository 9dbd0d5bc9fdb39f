//! Boundary validation helpers for request payloads.
//!
//! Handlers validate at the edge and return early with a 400-class error;
//! these combinators keep that uniform.

use crate::utils::errors::AuthServiceError;

/// Requires a string field to be present and non-blank.
///
/// Returns the trimmed value so downstream code never sees padding.
pub fn require_field<'a>(field: &str, value: &'a str) -> Result<&'a str, AuthServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthServiceError::validation(field, "is required"));
    }
    Ok(trimmed)
}

/// Requires an optional field to be present, then applies the non-blank rule.
pub fn require_some<'a>(
    field: &str,
    value: Option<&'a str>,
) -> Result<&'a str, AuthServiceError> {
    match value {
        Some(v) => require_field(field, v),
        None => Err(AuthServiceError::validation(field, "is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_blank_value() {
        assert_eq!(require_field("username", "alice").unwrap(), "alice");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(require_field("username", "  alice  ").unwrap(), "alice");
    }

    #[test]
    fn rejects_empty_value() {
        let err = require_field("username", "").unwrap_err();
        assert!(matches!(
            err,
            AuthServiceError::Validation { ref field, .. } if field == "username"
        ));
    }

    #[test]
    fn rejects_blank_value() {
        assert!(require_field("password", "   ").is_err());
    }

    #[test]
    fn rejects_missing_option() {
        let err = require_some("refreshToken", None).unwrap_err();
        assert!(matches!(
            err,
            AuthServiceError::Validation { ref field, .. } if field == "refreshToken"
        ));
    }

    #[test]
    fn unwraps_present_option() {
        assert_eq!(
            require_some("refreshToken", Some("abc123")).unwrap(),
            "abc123"
        );
    }
}
