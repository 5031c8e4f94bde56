//! Field codecs applied to individual model fields.

/// Unix-seconds ↔ `DateTime<Utc>` conversion for timestamp columns.
///
/// Columns are stored as dates and exposed as integer seconds. `None` maps to
/// `None` in both directions.
pub mod timestamp {
    use chrono::{DateTime, Utc};

    use crate::ValidationError;

    /// Stored date → exposed seconds.
    pub fn to_unix(value: Option<DateTime<Utc>>) -> Option<i64> {
        value.map(|dt| dt.timestamp())
    }

    /// Exposed seconds → stored date.
    pub fn from_unix(value: Option<i64>) -> Result<Option<DateTime<Utc>>, ValidationError> {
        match value {
            None => Ok(None),
            Some(secs) => DateTime::from_timestamp(secs, 0)
                .map(Some)
                .ok_or_else(|| ValidationError::InvalidValue {
                    field: "timestamp".to_string(),
                    reason: format!("{secs} is out of range"),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::timestamp;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_null_passes_through() {
        assert_eq!(timestamp::to_unix(None), None);
        assert_eq!(timestamp::from_unix(None).unwrap(), None);
    }

    #[test]
    fn test_known_instant() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(timestamp::to_unix(Some(dt)), Some(1_704_164_645));
        assert_eq!(timestamp::from_unix(Some(1_704_164_645)).unwrap(), Some(dt));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(timestamp::from_unix(Some(i64::MAX)).is_err());
    }
}
