//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a pad identifier is 1 to 32 lowercase alphanumeric
/// characters or dashes.
///
/// # Examples
///
/// ```ignore
/// validate_pad_id("table-pad-1") // Ok
/// validate_pad_id("Table")       // Err - uppercase
/// validate_pad_id("")            // Err - empty
/// ```
pub fn validate_pad_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > 32 {
        let mut err = ValidationError::new("pad_id_length");
        err.message =
            Some(format!("Pad ID must be 1 to 32 characters (got {})", id.len()).into());
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        let mut err = ValidationError::new("pad_id_format");
        err.message = Some(
            "Pad ID must contain only lowercase letters, digits, or dashes".into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_pad_ids() {
        assert!(validate_pad_id("table-pad-1").is_ok());
        assert!(validate_pad_id("a").is_ok());
        assert!(validate_pad_id("0123456789").is_ok());
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!(validate_pad_id("").is_err());
        assert!(validate_pad_id(&"x".repeat(33)).is_err());
    }

    #[test]
    fn rejects_bad_characters() {
        assert!(validate_pad_id("Table").is_err());
        assert!(validate_pad_id("pad_1").is_err());
        assert!(validate_pad_id("pad 1").is_err());
    }
}
