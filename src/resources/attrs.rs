//! Attribute helpers shared by the collector and source resources.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::model::{DateFormat, SourceFilter};
use crate::duration::parse_duration;
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};
use crate::timestamp::{format_rfc3339, parse_rfc3339};

/// Filter types the API accepts.
pub const FILTER_TYPES: &[&str] = &["Include", "Exclude", "Hash", "Mask", "Forward"];

/// Decode a state or configuration object, filling schema defaults first.
///
/// Null attributes are treated as unset, so state structs see their own
/// defaults for anything neither configured nor computed.
pub fn decode_state<T: DeserializeOwned>(schema: &Schema, value: Value) -> Result<T, ProviderError> {
    let mut map = match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ProviderError::Validation(format!(
                "expected an object, got {}",
                other
            )))
        }
    };
    schema.apply_defaults(&mut map);
    map.retain(|_, v| !v.is_null());
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ProviderError::Validation(format!("invalid resource state: {}", e)))
}

/// Encode a state struct, dropping unset attributes.
pub fn encode_state<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// The ID a state must carry once the object exists.
pub fn require_id(id: Option<u64>, what: &str) -> Result<u64, ProviderError> {
    id.ok_or_else(|| ProviderError::InvalidRequest(format!("{} state has no id", what)))
}

/// `None` for an empty string.
pub fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// `cutoff_timestamp` from configuration; unset or empty means no cutoff.
pub fn parse_cutoff(value: Option<&str>) -> Result<Option<DateTime<Utc>>, ProviderError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_rfc3339(raw).map(Some),
    }
}

/// Render a cutoff instant as RFC3339.
pub fn format_cutoff(value: Option<DateTime<Utc>>) -> Option<String> {
    value.as_ref().map(format_rfc3339)
}

/// `scan_interval` from configuration. Must be a positive duration.
pub fn parse_scan_interval(value: &str) -> Result<Duration, ProviderError> {
    let interval = parse_duration(value)?;
    if interval.is_zero() {
        return Err(ProviderError::Validation(
            "scan_interval must be greater than zero".to_string(),
        ));
    }
    Ok(interval)
}

/// Numeric IDs carried as decimal strings in state, e.g. `"id": "100772723"`.
///
/// Numbers are accepted on input as well.
pub mod id_string {
    use serde::{Deserializer, Serializer};

    /// Serialize an ID as a string.
    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => serializer.serialize_str(&id.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Accept an ID as a string or a number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::deserialize_flexible_id(deserializer)
    }
}

/// Numeric IDs carried as numbers in state, e.g. `"collector_id": 42`.
///
/// Numeric strings are accepted on input as well.
pub mod id_number {
    use serde::{Deserializer, Serializer};

    /// Serialize an ID as a number.
    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => serializer.serialize_u64(*id),
            None => serializer.serialize_none(),
        }
    }

    /// Accept an ID as a number or a numeric string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::deserialize_flexible_id(deserializer)
    }
}

fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Float(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(id)) => Ok(Some(id)),
        Some(Raw::Float(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Ok(Some(f as u64))
        }
        Some(Raw::Float(f)) => Err(D::Error::custom(format!("invalid id {}", f))),
        Some(Raw::Text(text)) if text.is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid id {:?}", text))),
    }
}

/// One `default_date_formats` item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormatBlock {
    /// Timestamp format string.
    pub format: String,
    /// Regex locating the timestamp in a message.
    pub locator: Option<String>,
}

impl From<&DateFormatBlock> for DateFormat {
    fn from(block: &DateFormatBlock) -> Self {
        DateFormat {
            format: block.format.clone(),
            locator: block.locator.clone().filter(|l| !l.is_empty()),
        }
    }
}

impl From<&DateFormat> for DateFormatBlock {
    fn from(format: &DateFormat) -> Self {
        DateFormatBlock {
            format: format.format.clone(),
            locator: format.locator.clone(),
        }
    }
}

/// One `filters` item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterBlock {
    /// `Include`, `Exclude`, `Hash`, `Mask` or `Forward`.
    #[serde(rename = "type")]
    pub filter_type: String,
    /// Rule name.
    pub name: String,
    /// Regex the rule matches.
    pub regexp: String,
    /// Replacement text for `Mask` rules.
    pub mask: Option<String>,
}

impl From<&FilterBlock> for SourceFilter {
    fn from(block: &FilterBlock) -> Self {
        SourceFilter {
            filter_type: block.filter_type.clone(),
            name: block.name.clone(),
            regexp: block.regexp.clone(),
            mask: block.mask.clone().filter(|m| !m.is_empty()),
        }
    }
}

impl From<&SourceFilter> for FilterBlock {
    fn from(filter: &SourceFilter) -> Self {
        FilterBlock {
            filter_type: filter.filter_type.clone(),
            name: filter.name.clone(),
            regexp: filter.regexp.clone(),
            mask: filter.mask.clone(),
        }
    }
}

/// Schema of the `default_date_formats` block.
pub fn date_formats_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute("format", Attribute::required_string())
            .with_attribute("locator", Attribute::optional_string()),
    )
}

/// Schema of the `filters` block.
pub fn filters_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute(
                "type",
                Attribute::required_string().with_description(FILTER_TYPES.join(", ")),
            )
            .with_attribute("name", Attribute::required_string())
            .with_attribute("regexp", Attribute::required_string())
            .with_attribute("mask", Attribute::optional_string()),
    )
}

/// Value checks that go beyond presence and type.
pub fn check_values(config: &Value, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(raw) = config.get("cutoff_timestamp").and_then(Value::as_str) {
        if let Err(e) = parse_cutoff(Some(raw)) {
            diagnostics.push(
                Diagnostic::error("Invalid cutoff_timestamp")
                    .with_detail(e.message().to_string())
                    .with_attribute("cutoff_timestamp"),
            );
        }
    }

    if let Some(raw) = config.get("scan_interval").and_then(Value::as_str) {
        if let Err(e) = parse_scan_interval(raw) {
            diagnostics.push(
                Diagnostic::error("Invalid scan_interval")
                    .with_detail(e.message().to_string())
                    .with_attribute("scan_interval"),
            );
        }
    }

    if let Some(filters) = config.get("filters").and_then(Value::as_array) {
        for (i, filter) in filters.iter().enumerate() {
            if let Some(kind) = filter.get("type").and_then(Value::as_str) {
                if !FILTER_TYPES.contains(&kind) {
                    diagnostics.push(
                        Diagnostic::error(format!("Unsupported filter type {:?}", kind))
                            .with_detail(format!("Expected one of {}", FILTER_TYPES.join(", ")))
                            .with_attribute(format!("filters.{}.type", i)),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Ids {
        #[serde(with = "id_string")]
        id: Option<u64>,
        #[serde(with = "id_number")]
        collector_id: Option<u64>,
        encoding: String,
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let ids: Ids = serde_json::from_value(json!({"id": 12, "collector_id": "34"})).unwrap();
        assert_eq!((ids.id, ids.collector_id), (Some(12), Some(34)));

        let ids: Ids = serde_json::from_value(json!({"id": "", "collector_id": 34.0})).unwrap();
        assert_eq!((ids.id, ids.collector_id), (None, Some(34)));

        assert!(serde_json::from_value::<Ids>(json!({"id": "abc"})).is_err());

        let encoded = serde_json::to_value(Ids {
            id: Some(7),
            collector_id: Some(8),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(encoded["id"], "7");
        assert_eq!(encoded["collector_id"], 8);
    }

    #[test]
    fn test_decode_state_applies_defaults() {
        let schema = Schema::v0().with_attribute(
            "encoding",
            Attribute::optional_string().with_default(json!("UTF-8")),
        );
        let ids: Ids = decode_state(&schema, json!({"id": "1"})).unwrap();
        assert_eq!(ids.encoding, "UTF-8");

        let ids: Ids = decode_state(&Schema::v0(), json!({"id": "1", "encoding": null})).unwrap();
        assert_eq!(ids.encoding, "");

        let err = decode_state::<Ids>(&schema, json!("nope")).unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_cutoff_parsing() {
        assert_eq!(parse_cutoff(None).unwrap(), None);
        assert_eq!(parse_cutoff(Some("")).unwrap(), None);
        let cutoff = parse_cutoff(Some("2017-03-01T12:00:00Z")).unwrap();
        assert_eq!(format_cutoff(cutoff).as_deref(), Some("2017-03-01T12:00:00Z"));
        assert!(parse_cutoff(Some("March 1st")).is_err());
    }

    #[test]
    fn test_scan_interval_must_be_positive() {
        assert_eq!(parse_scan_interval("1m0s").unwrap(), Duration::from_secs(60));
        assert!(parse_scan_interval("0s").is_err());
        assert!(parse_scan_interval("often").is_err());
    }

    #[test]
    fn test_filter_conversion_drops_empty_mask() {
        let block = FilterBlock {
            filter_type: "Exclude".to_string(),
            name: "debug".to_string(),
            regexp: ".*DEBUG.*".to_string(),
            mask: Some(String::new()),
        };
        let wire = SourceFilter::from(&block);
        assert!(wire.mask.is_none());
        assert_eq!(FilterBlock::from(&wire).filter_type, "Exclude");
    }

    #[test]
    fn test_check_values() {
        let mut diagnostics = Vec::new();
        check_values(
            &json!({
                "cutoff_timestamp": "yesterday",
                "scan_interval": "0",
                "filters": [{"type": "Drop", "name": "x", "regexp": "y"}]
            }),
            &mut diagnostics,
        );
        let attributes: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(attributes, vec!["cutoff_timestamp", "scan_interval", "filters.0.type"]);

        let mut diagnostics = Vec::new();
        check_values(&json!({"scan_interval": "5m"}), &mut diagnostics);
        assert!(diagnostics.is_empty());
    }
}
