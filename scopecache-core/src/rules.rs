//! Value rules for properties shared by most models.

use crate::{ModelId, ValidationError};

/// Largest timestamp accepted (positive 32-bit range).
pub const TIMESTAMP_MAX: i64 = i32::MAX as i64;

/// Id: positive big integer.
pub fn check_id(value: i64) -> Result<ModelId, ValidationError> {
    ModelId::try_from(value)
}

/// Timestamp: positive integer seconds.
pub fn check_timestamp(value: i64) -> Result<i64, ValidationError> {
    if (1..=TIMESTAMP_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(invalid("timestamp", format!("{value} is not a positive integer")))
    }
}

/// Flag: 0 or 1.
pub fn check_flag(value: i64) -> Result<bool, ValidationError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(invalid("flag", format!("{other} is not 0 or 1"))),
    }
}

/// IP: string.
pub fn check_ip(value: &str) -> Result<&str, ValidationError> {
    check_string("ip", value)
}

/// Transaction id: string.
pub fn check_transaction_id(value: &str) -> Result<&str, ValidationError> {
    check_string("transaction_id", value)
}

fn check_string<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        Err(invalid(field, "must not be empty"))
    } else {
        Ok(value)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(check_flag(0), Ok(false));
        assert_eq!(check_flag(1), Ok(true));
        assert!(check_flag(2).is_err());
        assert!(check_flag(-1).is_err());
    }

    #[test]
    fn test_timestamp_bounds() {
        assert!(check_timestamp(0).is_err());
        assert!(check_timestamp(1).is_ok());
        assert!(check_timestamp(TIMESTAMP_MAX).is_ok());
        assert!(check_timestamp(TIMESTAMP_MAX + 1).is_err());
    }

    #[test]
    fn test_string_rules() {
        assert_eq!(check_ip("10.0.0.1"), Ok("10.0.0.1"));
        assert!(check_ip(" ").is_err());
        assert!(check_transaction_id("tx-1").is_ok());
    }

    proptest! {
        #[test]
        fn prop_check_id_accepts_exactly_positive(value in any::<i64>()) {
            let result = check_id(value);
            prop_assert_eq!(result.is_ok(), value > 0);
            if let Ok(id) = result {
                prop_assert_eq!(id.get(), value as u64);
            }
        }
    }
}
