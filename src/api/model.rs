//! Wire entities of the collector management API.
//!
//! Field names follow the API's camelCase JSON. Timestamps and intervals are
//! converted from epoch/interval milliseconds at the serde boundary so the rest
//! of the crate only sees `DateTime<Utc>` and `Duration`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;

/// An entity addressed by numeric ID and wrapped in a named envelope on the wire.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Envelope key for single entities (`{"collector": {...}}`).
    const KEY: &'static str;
    /// Envelope key for listings (`{"collectors": [...]}`).
    const LIST_KEY: &'static str;

    /// The server-assigned ID.
    fn id(&self) -> u64;

    /// The display name, used to resolve import identifiers.
    fn name(&self) -> &str;
}

/// Wrap a value in a `{key: value}` envelope.
pub(crate) fn wrap<T: Serialize>(key: &str, value: &T) -> Result<Value, ProviderError> {
    let mut envelope = serde_json::Map::new();
    envelope.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(Value::Object(envelope))
}

/// Take the value under `key` out of an envelope; `None` if absent or null.
pub(crate) fn unwrap<T: DeserializeOwned>(
    key: &str,
    mut envelope: Value,
) -> Result<Option<T>, ProviderError> {
    match envelope.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(inner) => Ok(Some(serde_json::from_value(inner)?)),
    }
}

// ============================================================================
// Collectors
// ============================================================================

/// Kind of collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollectorType {
    /// Runs inside Sumo Logic; owns HTTP, syslog and polling sources.
    #[default]
    Hosted,
    /// Installed on a customer host; owns local/remote file sources.
    Installable,
    /// Any type this crate does not model.
    #[serde(other)]
    Unknown,
}

impl CollectorType {
    /// The wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hosted => "Hosted",
            Self::Installable => "Installable",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CollectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectorType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hosted" => Ok(Self::Hosted),
            "Installable" => Ok(Self::Installable),
            other => Err(ProviderError::Validation(format!(
                "unsupported collector type {:?}",
                other
            ))),
        }
    }
}

/// A hyperlink attached to a collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorLink {
    /// Link relation.
    pub rel: String,
    /// Target path.
    pub href: String,
}

/// A collector as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collector {
    /// Server-assigned ID.
    #[serde(default)]
    pub id: u64,
    /// Display name; unique per account.
    pub name: String,
    /// Collector type.
    #[serde(default)]
    pub collector_type: CollectorType,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Default source category.
    #[serde(default)]
    pub category: String,
    /// Host name of an installed collector.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host_name: String,
    /// Time zone applied to messages without one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub time_zone: String,
    /// Removed after 12 hours offline.
    #[serde(default)]
    pub ephemeral: bool,
    /// Currently reporting.
    #[serde(default)]
    pub alive: bool,
    /// Last heartbeat, in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_alive: Option<i64>,
    /// Version of an installed collector.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collector_version: String,
    /// `UI` or `Json`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_sync_mode: String,
    /// Architecture of the host.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_arch: String,
    /// Operating system version of the host.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_version: String,
    /// Operating system name of the host.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_name: String,
    /// Clock of the host, in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_time: Option<i64>,
    /// Only ingest data newer than this instant.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::timestamp::millis_option"
    )]
    pub cutoff_timestamp: Option<DateTime<Utc>>,
    /// Relative alternative to `cutoff_timestamp`, e.g. `-1d`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cutoff_relative_time: String,
    /// CPU usage percentage the collector is throttled to.
    #[serde(rename = "targetCPU", default, skip_serializing_if = "Option::is_none")]
    pub target_cpu: Option<i64>,
    /// Related API resources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<CollectorLink>,
}

impl Entity for Collector {
    const KEY: &'static str = "collector";
    const LIST_KEY: &'static str = "collectors";

    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// The creation payload for a collector; the server fills in everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorCreate {
    /// Collector type.
    pub collector_type: CollectorType,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Default source category.
    pub category: String,
}

// ============================================================================
// Sources
// ============================================================================

/// Kind of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceType {
    /// HTTP ingestion endpoint.
    #[serde(rename = "HTTP")]
    Http,
    /// Hosted syslog listener.
    Cloudsyslog,
    /// Polls a third-party resource (S3 bucket, CloudWatch).
    Polling,
    /// Tails files on an installed collector's host.
    LocalFile,
    /// Reads files over SSH from an installed collector.
    RemoteFile,
    /// Syslog listener on an installed collector.
    Syslog,
    /// Any type this crate does not model.
    #[default]
    #[serde(other)]
    Unknown,
}

impl SourceType {
    /// The wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Cloudsyslog => "Cloudsyslog",
            Self::Polling => "Polling",
            Self::LocalFile => "LocalFile",
            Self::RemoteFile => "RemoteFile",
            Self::Syslog => "Syslog",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP" => Ok(Self::Http),
            "Cloudsyslog" => Ok(Self::Cloudsyslog),
            "Polling" => Ok(Self::Polling),
            "LocalFile" => Ok(Self::LocalFile),
            "RemoteFile" => Ok(Self::RemoteFile),
            "Syslog" => Ok(Self::Syslog),
            other => Err(ProviderError::Validation(format!(
                "unsupported source type {:?}",
                other
            ))),
        }
    }
}

/// Content type of a polling source. Doubles as the third-party service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollingContentType {
    /// CloudTrail logs in S3.
    AwsCloudTrailBucket,
    /// CloudFront access logs in S3.
    AwsCloudFrontBucket,
    /// Load balancer access logs in S3.
    AwsElbBucket,
    /// Any objects in S3.
    AwsS3Bucket,
    /// S3 server access logs.
    AwsS3AuditBucket,
    /// CloudWatch metrics.
    AwsCloudWatch,
    /// Any polling content this crate does not model.
    #[serde(other)]
    Other,
}

impl PollingContentType {
    /// Whether the source polls an S3 bucket (as opposed to an API).
    pub fn is_bucket(&self) -> bool {
        !matches!(self, Self::AwsCloudWatch | Self::Other)
    }
}

/// A date format hint for message timestamp parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFormat {
    /// Timestamp format string.
    pub format: String,
    /// Regex locating the timestamp in a message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

/// A processing rule applied to ingested messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFilter {
    /// `Include`, `Exclude`, `Hash`, `Mask` or `Forward`.
    pub filter_type: String,
    /// Rule name.
    pub name: String,
    /// Regex the rule matches.
    pub regexp: String,
    /// Replacement text for `Mask` rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
}

/// Where a polling source reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourcePath {
    /// Objects of a bucket matching a key pattern.
    #[serde(rename_all = "camelCase")]
    S3BucketPathExpression {
        /// Bucket to poll.
        bucket_name: String,
        /// Key pattern within the bucket.
        path_expression: String,
    },
    /// CloudWatch metrics by region and namespace.
    #[serde(rename_all = "camelCase")]
    CloudWatchPath {
        /// Regions to poll; all when empty.
        #[serde(default)]
        limit_to_regions: Vec<String>,
        /// Namespaces to poll; all when empty.
        #[serde(default)]
        limit_to_namespaces: Vec<String>,
    },
    /// A path type this crate does not model.
    #[serde(other)]
    Unknown,
}

/// How a polling source authenticates against the third party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceAuthentication {
    /// AWS key pair.
    S3BucketAuthentication {
        /// AWS access key ID.
        #[serde(rename = "awsId")]
        access_key: String,
        /// Write-only; the API never echoes it.
        #[serde(rename = "awsKey", default, skip_serializing_if = "Option::is_none")]
        secret_key: Option<String>,
    },
    /// An authentication type this crate does not model.
    #[serde(other)]
    Unknown,
}

/// One third-party resource polled by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPartyResource {
    /// What is polled.
    pub service_type: PollingContentType,
    /// Where it is polled from.
    pub path: ResourcePath,
    /// Credentials for the third party.
    pub authentication: ResourceAuthentication,
}

/// The third-party resources a polling source reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyRef {
    /// The polled resources.
    #[serde(default)]
    pub resources: Vec<ThirdPartyResource>,
}

impl ThirdPartyRef {
    /// A reference to a single resource.
    pub fn single(resource: ThirdPartyResource) -> Self {
        Self {
            resources: vec![resource],
        }
    }

    /// The first resource, which is the only one the declarative kinds use.
    pub fn primary(&self) -> Option<&ThirdPartyResource> {
        self.resources.first()
    }
}

/// A source as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Server-assigned ID.
    #[serde(default)]
    pub id: u64,
    /// Display name; unique within the collector.
    pub name: String,
    /// Wire type.
    #[serde(default)]
    pub source_type: SourceType,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Source category tagged on ingested data.
    #[serde(default)]
    pub category: String,
    /// Host name tagged on ingested data.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host_name: String,
    /// Time zone applied to messages without one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub time_zone: String,
    /// Apply `time_zone` even to messages carrying one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_time_zone: Option<bool>,
    /// Parse message timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic_date_parsing: Option<bool>,
    /// Group lines into multiline messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline_processing_enabled: Option<bool>,
    /// Detect message boundaries automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_autoline_matching: Option<bool>,
    /// Regex marking the first line of a message.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manual_prefix_regexp: String,
    /// Timestamp format when automatic parsing is off.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_date_format: String,
    /// Timestamp formats tried in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_date_formats: Vec<DateFormat>,
    /// Processing rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<SourceFilter>,
    /// Only ingest data newer than this instant.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::timestamp::millis_option"
    )]
    pub cutoff_timestamp: Option<DateTime<Utc>>,
    /// Relative cutoff such as `-1d`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cutoff_relative_time: String,
    /// HTTP sources: one message per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_per_request: Option<bool>,
    /// File sources: glob of the files to collect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_expression: Option<String>,
    /// File sources: globs excluded from collection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blacklist: Vec<String>,
    /// File sources: character encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Polling sources: what is polled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<PollingContentType>,
    /// Polling sources: interval between polls.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::duration::millis_option"
    )]
    pub scan_interval: Option<Duration>,
    /// Polling sources: polling is suspended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    /// Polling sources: the polled resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_party_ref: Option<ThirdPartyRef>,
    /// Ingestion URL of an HTTP source; assigned by the server.
    #[serde(default, skip_serializing)]
    pub url: Option<String>,
}

impl Entity for Source {
    const KEY: &'static str = "source";
    const LIST_KEY: &'static str = "sources";

    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// The creation payload for a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCreate {
    /// Wire type.
    pub source_type: SourceType,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Source category.
    pub category: String,
    /// HTTP sources: one message per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_per_request: Option<bool>,
    /// File sources: glob of the files to collect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_expression: Option<String>,
    /// Polling sources: what is polled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<PollingContentType>,
    /// Polling sources: interval between polls.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::duration::millis_option"
    )]
    pub scan_interval: Option<Duration>,
    /// Polling sources: polling is suspended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    /// Polling sources: the polled resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_party_ref: Option<ThirdPartyRef>,
}

impl SourceCreate {
    /// A creation payload with only the required fields set.
    pub fn new(source_type: SourceType, name: impl Into<String>) -> Self {
        Self {
            source_type,
            name: name.into(),
            description: String::new(),
            category: String::new(),
            message_per_request: None,
            path_expression: None,
            content_type: None,
            scan_interval: None,
            paused: None,
            third_party_ref: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_collector_decodes_service_payload() {
        let body = json!({
            "collector": {
                "id": 100772723,
                "name": "My Hosted Collector",
                "description": "An example Hosted Collector",
                "category": "HTTP Collection",
                "timeZone": "UTC",
                "links": [{"rel": "sources", "href": "/v1/collectors/100772723/sources"}],
                "collectorType": "Hosted",
                "collectorVersion": "",
                "lastSeenAlive": 1476818195411i64,
                "alive": true,
                "cutoffTimestamp": 0
            }
        });

        let collector: Collector = unwrap(Collector::KEY, body).unwrap().unwrap();
        assert_eq!(collector.id, 100772723);
        assert_eq!(collector.collector_type, CollectorType::Hosted);
        assert_eq!(collector.time_zone, "UTC");
        assert_eq!(collector.last_seen_alive, Some(1476818195411));
        assert!(collector.alive);
        assert!(collector.cutoff_timestamp.is_none());
        assert_eq!(collector.links.len(), 1);
    }

    #[test]
    fn test_unknown_types_do_not_break_decoding() {
        let collector: Collector =
            serde_json::from_value(json!({"id": 1, "name": "c", "collectorType": "Ephemeral"}))
                .unwrap();
        assert_eq!(collector.collector_type, CollectorType::Unknown);

        let source: Source = serde_json::from_value(json!({
            "id": 2,
            "name": "s",
            "sourceType": "Script",
            "contentType": "AwsMetadata"
        }))
        .unwrap();
        assert_eq!(source.source_type, SourceType::Unknown);
        assert_eq!(source.content_type, Some(PollingContentType::Other));
    }

    #[test]
    fn test_envelope_wrapping() {
        let create = CollectorCreate {
            collector_type: CollectorType::Hosted,
            name: "collector1".to_string(),
            description: String::new(),
            category: "prod".to_string(),
        };
        let wrapped = wrap(Collector::KEY, &create).unwrap();
        assert_eq!(
            wrapped,
            json!({"collector": {
                "collectorType": "Hosted",
                "name": "collector1",
                "description": "",
                "category": "prod"
            }})
        );

        let missing: Option<Collector> = unwrap(Collector::KEY, json!({})).unwrap();
        assert!(missing.is_none());
        let null: Option<Collector> = unwrap(Collector::KEY, json!({"collector": null})).unwrap();
        assert!(null.is_none());
    }

    #[test]
    fn test_polling_source_wire_shape() {
        let source = Source {
            id: 7,
            name: "trail".to_string(),
            source_type: SourceType::Polling,
            content_type: Some(PollingContentType::AwsCloudTrailBucket),
            scan_interval: Some(Duration::from_secs(60)),
            paused: Some(false),
            third_party_ref: Some(ThirdPartyRef::single(ThirdPartyResource {
                service_type: PollingContentType::AwsCloudTrailBucket,
                path: ResourcePath::S3BucketPathExpression {
                    bucket_name: "logs".to_string(),
                    path_expression: "AWSLogs/*".to_string(),
                },
                authentication: ResourceAuthentication::S3BucketAuthentication {
                    access_key: "AKIA".to_string(),
                    secret_key: Some("secret".to_string()),
                },
            })),
            url: Some("https://ignored".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value["sourceType"], "Polling");
        assert_eq!(value["contentType"], "AwsCloudTrailBucket");
        assert_eq!(value["scanInterval"], 60000);
        assert!(value.get("url").is_none());

        let resource = &value["thirdPartyRef"]["resources"][0];
        assert_eq!(resource["serviceType"], "AwsCloudTrailBucket");
        assert_eq!(
            resource["path"],
            json!({"type": "S3BucketPathExpression", "bucketName": "logs", "pathExpression": "AWSLogs/*"})
        );
        assert_eq!(
            resource["authentication"],
            json!({"type": "S3BucketAuthentication", "awsId": "AKIA", "awsKey": "secret"})
        );
    }

    #[test]
    fn test_cloudwatch_path_decodes() {
        let path: ResourcePath = serde_json::from_value(json!({
            "type": "CloudWatchPath",
            "limitToRegions": ["us-east-1"],
            "limitToNamespaces": ["AWS/EC2"]
        }))
        .unwrap();
        assert_eq!(
            path,
            ResourcePath::CloudWatchPath {
                limit_to_regions: vec!["us-east-1".to_string()],
                limit_to_namespaces: vec!["AWS/EC2".to_string()],
            }
        );
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("HTTP".parse::<SourceType>().unwrap(), SourceType::Http);
        assert!("http".parse::<SourceType>().is_err());
        assert_eq!(
            "Installable".parse::<CollectorType>().unwrap(),
            CollectorType::Installable
        );
        assert!(PollingContentType::AwsS3Bucket.is_bucket());
        assert!(!PollingContentType::AwsCloudWatch.is_bucket());
    }
}
