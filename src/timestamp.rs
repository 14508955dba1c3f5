//! Cutoff timestamps: RFC3339 strings in configuration, epoch milliseconds on the wire.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ProviderError;

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_rfc3339(input: &str) -> Result<DateTime<Utc>, ProviderError> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ProviderError::Validation(format!("invalid RFC3339 timestamp {:?}: {}", input, e)))
}

/// Format a timestamp as RFC3339 in UTC with a `Z` suffix.
pub fn format_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serde adapter for optional timestamps carried as epoch milliseconds.
///
/// The API reports "no cutoff" as `0` or by omitting the field; both decode
/// to `None`.
pub mod millis_option {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize as epoch milliseconds.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_i64(dt.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from epoch milliseconds.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<i64>::deserialize(deserializer)? {
            None | Some(0) => Ok(None),
            Some(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", ms))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_round_trip() {
        let parsed = parse_rfc3339("2017-03-01T12:00:00Z").unwrap();
        assert_eq!(parsed.timestamp_millis(), 1_488_369_600_000);
        assert_eq!(format_rfc3339(&parsed), "2017-03-01T12:00:00Z");
    }

    #[test]
    fn test_offsets_normalize_to_utc() {
        let parsed = parse_rfc3339("2017-03-01T14:00:00+02:00").unwrap();
        assert_eq!(format_rfc3339(&parsed), "2017-03-01T12:00:00Z");
    }

    #[test]
    fn test_invalid_timestamp() {
        let err = parse_rfc3339("yesterday").unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_millis_serde() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wire {
            #[serde(default, with = "millis_option")]
            cutoff: Option<DateTime<Utc>>,
        }

        let wire: Wire = serde_json::from_str(r#"{"cutoff": 1488369600000}"#).unwrap();
        assert_eq!(
            wire.cutoff.map(|c| format_rfc3339(&c)).as_deref(),
            Some("2017-03-01T12:00:00Z")
        );

        let wire: Wire = serde_json::from_str(r#"{"cutoff": 0}"#).unwrap();
        assert!(wire.cutoff.is_none());

        let value = serde_json::to_value(Wire {
            cutoff: Some(parse_rfc3339("2017-03-01T12:00:00Z").unwrap()),
        })
        .unwrap();
        assert_eq!(value["cutoff"], 1_488_369_600_000i64);
    }
}
