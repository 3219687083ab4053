//! Input validation for profile, preference and link-code values.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Not an `HH:MM` time of day.
    InvalidTimeOfDay(String),
    /// Not an 8-character `A-Z0-9` link code.
    InvalidLinkCode(String),
    /// Not a number where one is required.
    InvalidNumber { field: String, value: String },
    /// Number outside the accepted range.
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidTimeOfDay(value) => {
                write!(f, "Invalid time of day '{}' (expected HH:MM)", value)
            }
            ValidationError::InvalidLinkCode(value) => write!(f, "Invalid link code '{}'", value),
            ValidationError::InvalidNumber { field, value } => {
                write!(f, "{} must be a number, got '{}'", field, value)
            }
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(f, "{} must be between {} and {} (got {})", field, min, max, actual),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Length of a link code.
pub const LINK_CODE_LENGTH: usize = 8;

/// Maximum allowed length for free-text profile fields.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Maximum allowed length for short labels (activity level, timezone).
pub const MAX_LABEL_LENGTH: usize = 64;

/// Normalize and validate a link code: trimmed, uppercased, 8 of `A-Z0-9`.
pub fn normalize_link_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim().to_uppercase();

    if code.is_empty() {
        return Err(ValidationError::Empty("link code".to_string()));
    }

    let valid = code.len() == LINK_CODE_LENGTH
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if !valid {
        return Err(ValidationError::InvalidLinkCode(code));
    }

    Ok(code)
}

/// Validate an `HH:MM` (24h) time of day.
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidTimeOfDay(value.to_string());

    let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(())
}

/// Validate a number against an inclusive range.
pub fn validate_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            actual: value,
        });
    }
    Ok(())
}

/// Validate free text length; empty text is allowed (it clears the field).
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual: len,
        });
    }
    Ok(())
}

/// Parse a number field from user input.
pub fn parse_number(field: &str, value: &str) -> Result<f64, ValidationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_link_code() {
        assert_eq!(normalize_link_code("abcd1234").unwrap(), "ABCD1234");
        assert_eq!(normalize_link_code("  ZZ00XX11 ").unwrap(), "ZZ00XX11");

        assert!(matches!(
            normalize_link_code(""),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            normalize_link_code("ABC123"),
            Err(ValidationError::InvalidLinkCode(_))
        ));
        assert!(matches!(
            normalize_link_code("ABCD-123"),
            Err(ValidationError::InvalidLinkCode(_))
        ));
    }

    #[test]
    fn test_validate_time_of_day() {
        assert!(validate_time_of_day("00:00").is_ok());
        assert!(validate_time_of_day("22:00").is_ok());
        assert!(validate_time_of_day("23:59").is_ok());

        assert!(validate_time_of_day("24:00").is_err());
        assert!(validate_time_of_day("7:00").is_err());
        assert!(validate_time_of_day("07:60").is_err());
        assert!(validate_time_of_day("0700").is_err());
        assert!(validate_time_of_day("ab:cd").is_err());
    }

    #[test]
    fn test_validate_range_and_numbers() {
        assert!(validate_range("age", 30.0, 0.0, 120.0).is_ok());
        assert!(validate_range("age", 0.0, 0.0, 120.0).is_ok());
        assert!(matches!(
            validate_range("age", 121.0, 0.0, 120.0),
            Err(ValidationError::OutOfRange { .. })
        ));

        assert_eq!(parse_number("weight", " 72.5 ").unwrap(), 72.5);
        assert!(parse_number("weight", "heavy").is_err());
        assert!(parse_number("weight", "NaN").is_err());
    }

    #[test]
    fn test_validate_text() {
        assert!(validate_text("goals", "", MAX_TEXT_LENGTH).is_ok());
        assert!(validate_text("goals", "walk more", MAX_TEXT_LENGTH).is_ok());
        assert!(matches!(
            validate_text("activity level", &"a".repeat(65), MAX_LABEL_LENGTH),
            Err(ValidationError::TooLong { max: 64, .. })
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidTimeOfDay("7pm".to_string());
        assert_eq!(err.to_string(), "Invalid time of day '7pm' (expected HH:MM)");

        let err = ValidationError::TooLong {
            field: "goals".to_string(),
            max: 2000,
            actual: 2100,
        };
        assert_eq!(err.to_string(), "goals is too long (2100 chars, max 2000)");
    }
}
