//! API utility functions
//!
//! Helpers shared by handlers for request validation.

use crate::error::AppError;

/// Require a present, non-blank string field
///
/// # Returns
/// * `Ok(&str)` - The trimmed value
/// * `Err(AppError::InvalidRequest)` - Field missing or blank
pub fn require_field<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::InvalidRequest(format!("{} is required", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field() {
        assert_eq!(require_field(Some("  builder "), "type").unwrap(), "builder");
        assert!(require_field(Some("   "), "type").is_err());
        match require_field(None, "task") {
            Err(AppError::InvalidRequest(msg)) => assert_eq!(msg, "task is required"),
            other => panic!("Expected InvalidRequest, got: {:?}", other),
        }
    }
}
