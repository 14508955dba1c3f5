//! Source resources.
//!
//! Every source kind shares the attributes in [`SourceCommon`] and the
//! lifecycle in [`SourceResource`]; a [`SourceKind`] contributes the
//! type-specific attributes and their translation to and from the wire.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::attrs::{
    self, decode_state, encode_state, non_empty, require_id, DateFormatBlock, FilterBlock,
};
use super::ResourceAdapter;
use crate::api::model::{DateFormat, SourceFilter};
use crate::api::{
    Client, PollingContentType, ResourceAuthentication, ResourcePath, Source, SourceCreate,
    SourceType, ThirdPartyRef, ThirdPartyResource,
};
use crate::duration::format_duration;
use crate::error::ProviderError;
use crate::import::resolve_source_identifier;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation;

/// Attributes shared by every source kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceCommon {
    /// Server-assigned ID.
    #[serde(with = "attrs::id_string")]
    pub id: Option<u64>,
    /// Collector owning the source.
    #[serde(with = "attrs::id_number")]
    pub collector_id: Option<u64>,
    /// Display name; unique within the collector.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Source category tagged on ingested data.
    pub category: String,
    /// Host name tagged on ingested data.
    pub host: Option<String>,
    /// Time zone applied to messages without one.
    pub time_zone: Option<String>,
    /// Apply `time_zone` even to messages carrying one.
    pub force_time_zone: Option<bool>,
    /// Parse message timestamps.
    pub automatic_date_parsing: Option<bool>,
    /// Group lines into multiline messages.
    pub multiline_processing_enabled: Option<bool>,
    /// Detect message boundaries automatically.
    pub use_autoline_matching: Option<bool>,
    /// Regex marking the first line of a message.
    pub manual_prefix_regexp: Option<String>,
    /// Timestamp format when automatic parsing is off.
    pub default_date_format: Option<String>,
    /// Timestamp formats tried in order.
    pub default_date_formats: Vec<DateFormatBlock>,
    /// Processing rules.
    pub filters: Vec<FilterBlock>,
    /// Only ingest data newer than this RFC3339 timestamp.
    pub cutoff_timestamp: Option<String>,
    /// Relative cutoff such as `-1d`.
    pub cutoff_relative_time: Option<String>,
}

impl SourceCommon {
    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "collector_id",
                Attribute::required_int64()
                    .with_force_new()
                    .with_description("Collector that owns the source"),
            )
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string().with_default(Value::from("")))
            .with_attribute("category", Attribute::optional_string().with_default(Value::from("")))
            .with_attribute("host", Attribute::optional_computed_string())
            .with_attribute("time_zone", Attribute::optional_computed_string())
            .with_attribute("force_time_zone", Attribute::optional_computed_bool())
            .with_attribute("automatic_date_parsing", Attribute::optional_computed_bool())
            .with_attribute("multiline_processing_enabled", Attribute::optional_computed_bool())
            .with_attribute("use_autoline_matching", Attribute::optional_computed_bool())
            .with_attribute("manual_prefix_regexp", Attribute::optional_computed_string())
            .with_attribute("default_date_format", Attribute::optional_computed_string())
            .with_block("default_date_formats", attrs::date_formats_block())
            .with_block("filters", attrs::filters_block())
            .with_attribute(
                "cutoff_timestamp",
                Attribute::optional_computed_string()
                    .with_description("Only collect data more recent than this RFC3339 timestamp"),
            )
            .with_attribute(
                "cutoff_relative_time",
                Attribute::optional_computed_string()
                    .with_description("Relative alternative to cutoff_timestamp: -1h, -1d or -1w"),
            )
    }

    fn require_collector_id(&self) -> Result<u64, ProviderError> {
        self.collector_id
            .ok_or_else(|| ProviderError::Validation("collector_id is required".to_string()))
    }

    /// The shared part of the full entity.
    pub fn to_wire(&self, id: u64, source_type: SourceType) -> Result<Source, ProviderError> {
        Ok(Source {
            id,
            name: self.name.clone(),
            source_type,
            description: self.description.clone(),
            category: self.category.clone(),
            host_name: self.host.clone().unwrap_or_default(),
            time_zone: self.time_zone.clone().unwrap_or_default(),
            force_time_zone: self.force_time_zone,
            automatic_date_parsing: self.automatic_date_parsing,
            multiline_processing_enabled: self.multiline_processing_enabled,
            use_autoline_matching: self.use_autoline_matching,
            manual_prefix_regexp: self.manual_prefix_regexp.clone().unwrap_or_default(),
            default_date_format: self.default_date_format.clone().unwrap_or_default(),
            default_date_formats: self.default_date_formats.iter().map(DateFormat::from).collect(),
            filters: self.filters.iter().map(SourceFilter::from).collect(),
            cutoff_timestamp: attrs::parse_cutoff(self.cutoff_timestamp.as_deref())?,
            cutoff_relative_time: self.cutoff_relative_time.clone().unwrap_or_default(),
            ..Default::default()
        })
    }

    /// The shared attributes of a stored source.
    pub fn from_wire(source: &Source, collector_id: u64) -> Self {
        Self {
            id: Some(source.id),
            collector_id: Some(collector_id),
            name: source.name.clone(),
            description: source.description.clone(),
            category: source.category.clone(),
            host: non_empty(&source.host_name),
            time_zone: non_empty(&source.time_zone),
            force_time_zone: source.force_time_zone,
            automatic_date_parsing: source.automatic_date_parsing,
            multiline_processing_enabled: source.multiline_processing_enabled,
            use_autoline_matching: source.use_autoline_matching,
            manual_prefix_regexp: non_empty(&source.manual_prefix_regexp),
            default_date_format: non_empty(&source.default_date_format),
            default_date_formats: source.default_date_formats.iter().map(DateFormatBlock::from).collect(),
            filters: source.filters.iter().map(FilterBlock::from).collect(),
            cutoff_timestamp: attrs::format_cutoff(source.cutoff_timestamp),
            cutoff_relative_time: non_empty(&source.cutoff_relative_time),
        }
    }
}

/// Declarative state of a source: the shared attributes plus the kind's own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceState<A> {
    /// Attributes every kind has.
    #[serde(flatten)]
    pub common: SourceCommon,
    /// Attributes of the kind.
    #[serde(flatten)]
    pub attrs: A,
}

/// The type-specific half of a source resource.
pub trait SourceKind: Send + Sync + 'static {
    /// The kind's own attributes.
    type Attributes: Serialize + DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync;

    /// Declarative type name of the kind.
    fn type_name(&self) -> &'static str;

    /// Add the kind's attributes to the shared schema.
    fn extend_schema(&self, schema: Schema) -> Schema;

    /// Wire type of the source.
    fn source_type(&self, attrs: &Self::Attributes) -> Result<SourceType, ProviderError>;

    /// Value checks beyond the schema.
    fn check(&self, _config: &Value, _diagnostics: &mut Vec<Diagnostic>) {}

    /// Whether an existing source can be managed as this kind.
    fn matches(&self, source: &Source) -> bool;

    /// Fields the creation payload must carry.
    fn to_create(&self, attrs: &Self::Attributes, create: &mut SourceCreate) -> Result<(), ProviderError>;

    /// Copy the kind's attributes onto the full entity.
    fn to_wire(&self, attrs: &Self::Attributes, source: &mut Source) -> Result<(), ProviderError>;

    /// The kind's attributes as stored. `prior` supplies write-only values.
    fn from_wire(&self, source: &Source, prior: &Self::Attributes) -> Self::Attributes;
}

/// Adapter for one source kind.
#[derive(Debug, Clone)]
pub struct SourceResource<K> {
    kind: K,
}

impl<K: SourceKind> SourceResource<K> {
    /// An adapter for `kind`.
    pub fn new(kind: K) -> Self {
        Self { kind }
    }

    /// The source kind.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    fn decode(&self, value: Value) -> Result<SourceState<K::Attributes>, ProviderError> {
        decode_state(&self.schema(), value)
    }

    fn to_wire(&self, state: &SourceState<K::Attributes>, id: u64) -> Result<Source, ProviderError> {
        let mut source = state.common.to_wire(id, self.kind.source_type(&state.attrs)?)?;
        self.kind.to_wire(&state.attrs, &mut source)?;
        Ok(source)
    }

    fn to_create(&self, state: &SourceState<K::Attributes>) -> Result<SourceCreate, ProviderError> {
        let mut create = SourceCreate::new(self.kind.source_type(&state.attrs)?, state.common.name.clone());
        create.description = state.common.description.clone();
        create.category = state.common.category.clone();
        self.kind.to_create(&state.attrs, &mut create)?;
        Ok(create)
    }

    fn state_of(&self, source: &Source, collector_id: u64, prior: &K::Attributes) -> Result<Value, ProviderError> {
        encode_state(&SourceState {
            common: SourceCommon::from_wire(source, collector_id),
            attrs: self.kind.from_wire(source, prior),
        })
    }

    async fn fetch(&self, client: &Client, collector_id: u64, id: u64) -> Result<Source, ProviderError> {
        client.sources(collector_id).get(id).await.map_err(|e| {
            if e.is_not_found() {
                ProviderError::NotFound(format!("source {} in collector {}", id, collector_id))
            } else {
                e
            }
        })
    }

    fn ids(&self, state: &SourceState<K::Attributes>) -> Result<(u64, u64), ProviderError> {
        let id = require_id(state.common.id, self.kind.type_name())?;
        Ok((state.common.require_collector_id()?, id))
    }
}

#[async_trait]
impl<K: SourceKind> ResourceAdapter for SourceResource<K> {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> Schema {
        self.kind.extend_schema(SourceCommon::schema())
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        attrs::check_values(config, &mut diagnostics);
        self.kind.check(config, &mut diagnostics);
        diagnostics
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        let state = self.decode(planned)?;
        let collector_id = state.common.require_collector_id()?;
        // Build the full entity first so bad values fail before the POST.
        let mut full = self.to_wire(&state, 0)?;

        let sources = client.sources(collector_id);
        let created = sources.create(&self.to_create(&state)?).await?;

        full.id = created.id;
        let stored = match sources.update(&full).await {
            Ok(()) => self.fetch(client, collector_id, created.id).await,
            Err(e) => Err(e),
        };
        match stored {
            Ok(stored) => self.state_of(&stored, collector_id, &state.attrs),
            Err(e) => {
                // Nothing tracks the new source yet, so remove it.
                warn!(collector_id, id = created.id, error = %e, "source create did not complete, deleting it");
                if let Err(cleanup) = sources.delete(created.id).await {
                    warn!(collector_id, id = created.id, error = %cleanup, "could not delete incomplete source");
                }
                Err(e)
            }
        }
    }

    async fn read(&self, client: &Client, current: Value) -> Result<Value, ProviderError> {
        let state = self.decode(current)?;
        let (collector_id, id) = self.ids(&state)?;
        let stored = self.fetch(client, collector_id, id).await?;
        self.state_of(&stored, collector_id, &state.attrs)
    }

    async fn update(&self, client: &Client, prior: Value, planned: Value) -> Result<Value, ProviderError> {
        let prior = self.decode(prior)?;
        let mut state = self.decode(planned)?;
        state.common.id = state.common.id.or(prior.common.id);
        state.common.collector_id = state.common.collector_id.or(prior.common.collector_id);
        let (collector_id, id) = self.ids(&state)?;

        client
            .sources(collector_id)
            .update(&self.to_wire(&state, id)?)
            .await?;
        info!(collector_id, id, resource = self.type_name(), "updated source");

        let stored = self.fetch(client, collector_id, id).await?;
        self.state_of(&stored, collector_id, &state.attrs)
    }

    async fn delete(&self, client: &Client, current: Value) -> Result<(), ProviderError> {
        let state = self.decode(current)?;
        let (collector_id, id) = self.ids(&state)?;
        match client.sources(collector_id).delete(id).await {
            Err(e) if e.is_not_found() => {
                debug!(collector_id, id, "source already deleted");
                Ok(())
            }
            other => other,
        }
    }

    async fn exists(&self, client: &Client, current: Value) -> Result<bool, ProviderError> {
        let state = self.decode(current)?;
        let (collector_id, id) = self.ids(&state)?;
        client.sources(collector_id).exists(id).await
    }

    async fn import(&self, client: &Client, identifier: &str) -> Result<Value, ProviderError> {
        let (collector_id, id) = resolve_source_identifier(client, identifier).await?;
        let stored = self.fetch(client, collector_id, id).await?;
        if !self.kind.matches(&stored) {
            return Err(ProviderError::InvalidRequest(format!(
                "source {} is a {} source and cannot be imported as {}",
                id,
                stored.source_type,
                self.type_name()
            )));
        }
        self.state_of(&stored, collector_id, &K::Attributes::default())
    }
}

// ============================================================================
// Polling sources
// ============================================================================

fn polling_schema(schema: Schema) -> Schema {
    schema
        .with_attribute("paused", Attribute::optional_bool().with_default(Value::Bool(false)))
        .with_attribute(
            "scan_interval",
            Attribute::required_string().with_description("How often to scan, e.g. 1m0s"),
        )
        .with_attribute("aws_access_key", Attribute::required_string())
        .with_attribute(
            "aws_secret_key",
            Attribute::required_string()
                .sensitive()
                .with_description("Write-only; never read back from the API"),
        )
}

fn s3_authentication(access_key: &str, secret_key: &Option<String>) -> ResourceAuthentication {
    ResourceAuthentication::S3BucketAuthentication {
        access_key: access_key.to_string(),
        secret_key: secret_key.clone(),
    }
}

fn stored_scan_interval(source: &Source, prior: &str) -> String {
    source
        .scan_interval
        .map(format_duration)
        .unwrap_or_else(|| prior.to_string())
}

fn stored_access_key(resource: Option<&ThirdPartyResource>) -> String {
    match resource.map(|r| &r.authentication) {
        Some(ResourceAuthentication::S3BucketAuthentication { access_key, .. }) => access_key.clone(),
        _ => String::new(),
    }
}

/// Attributes of an S3 bucket source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketAttributes {
    /// Stop polling without deleting the source.
    pub paused: bool,
    /// Polling interval, e.g. `5m`.
    pub scan_interval: String,
    /// Bucket to poll.
    pub aws_bucket: String,
    /// Key pattern within the bucket.
    pub path_expression: String,
    /// AWS access key ID.
    pub aws_access_key: String,
    /// AWS secret key. Write-only.
    pub aws_secret_key: Option<String>,
}

/// A polling source reading an S3 bucket; kinds differ only by content type.
#[derive(Debug, Clone)]
pub struct BucketSource {
    type_name: &'static str,
    content_type: PollingContentType,
}

impl BucketSource {
    /// A bucket kind polling `content_type`.
    pub fn new(type_name: &'static str, content_type: PollingContentType) -> Self {
        Self {
            type_name,
            content_type,
        }
    }

    /// Content the bucket holds.
    pub fn content_type(&self) -> PollingContentType {
        self.content_type
    }
}

impl SourceKind for BucketSource {
    type Attributes = BucketAttributes;

    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn extend_schema(&self, schema: Schema) -> Schema {
        polling_schema(schema)
            .with_attribute("aws_bucket", Attribute::required_string())
            .with_attribute(
                "path_expression",
                Attribute::optional_string().with_default(Value::from("*")),
            )
    }

    fn source_type(&self, _attrs: &BucketAttributes) -> Result<SourceType, ProviderError> {
        Ok(SourceType::Polling)
    }

    fn matches(&self, source: &Source) -> bool {
        source.source_type == SourceType::Polling && source.content_type == Some(self.content_type)
    }

    fn to_create(&self, attrs: &BucketAttributes, create: &mut SourceCreate) -> Result<(), ProviderError> {
        let mut source = Source::default();
        self.to_wire(attrs, &mut source)?;
        create.content_type = source.content_type;
        create.paused = source.paused;
        create.scan_interval = source.scan_interval;
        create.third_party_ref = source.third_party_ref;
        Ok(())
    }

    fn to_wire(&self, attrs: &BucketAttributes, source: &mut Source) -> Result<(), ProviderError> {
        source.content_type = Some(self.content_type);
        source.paused = Some(attrs.paused);
        source.scan_interval = Some(attrs::parse_scan_interval(&attrs.scan_interval)?);
        source.third_party_ref = Some(ThirdPartyRef::single(ThirdPartyResource {
            service_type: self.content_type,
            path: ResourcePath::S3BucketPathExpression {
                bucket_name: attrs.aws_bucket.clone(),
                path_expression: attrs.path_expression.clone(),
            },
            authentication: s3_authentication(&attrs.aws_access_key, &attrs.aws_secret_key),
        }));
        Ok(())
    }

    fn from_wire(&self, source: &Source, prior: &BucketAttributes) -> BucketAttributes {
        let resource = source.third_party_ref.as_ref().and_then(ThirdPartyRef::primary);
        let (aws_bucket, path_expression) = match resource.map(|r| &r.path) {
            Some(ResourcePath::S3BucketPathExpression {
                bucket_name,
                path_expression,
            }) => (bucket_name.clone(), path_expression.clone()),
            _ => (String::new(), String::new()),
        };
        BucketAttributes {
            paused: source.paused.unwrap_or(false),
            scan_interval: stored_scan_interval(source, &prior.scan_interval),
            aws_bucket,
            path_expression,
            aws_access_key: stored_access_key(resource),
            aws_secret_key: prior.aws_secret_key.clone(),
        }
    }
}

/// Attributes of a CloudWatch metrics source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudWatchAttributes {
    /// Stop polling without deleting the source.
    pub paused: bool,
    /// Polling interval, e.g. `5m`.
    pub scan_interval: String,
    /// Regions to poll; all when empty.
    pub limit_to_regions: Vec<String>,
    /// Namespaces to poll; all when empty.
    pub limit_to_namespaces: Vec<String>,
    /// AWS access key ID.
    pub aws_access_key: String,
    /// AWS secret key. Write-only.
    pub aws_secret_key: Option<String>,
}

/// `sumologic_cloudwatch_source`: polls CloudWatch metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudWatchSource;

impl SourceKind for CloudWatchSource {
    type Attributes = CloudWatchAttributes;

    fn type_name(&self) -> &'static str {
        "sumologic_cloudwatch_source"
    }

    fn extend_schema(&self, schema: Schema) -> Schema {
        polling_schema(schema)
            .with_attribute("limit_to_regions", Attribute::optional_string_list())
            .with_attribute("limit_to_namespaces", Attribute::optional_string_list())
    }

    fn source_type(&self, _attrs: &CloudWatchAttributes) -> Result<SourceType, ProviderError> {
        Ok(SourceType::Polling)
    }

    fn matches(&self, source: &Source) -> bool {
        source.source_type == SourceType::Polling
            && source.content_type == Some(PollingContentType::AwsCloudWatch)
    }

    fn to_create(&self, attrs: &CloudWatchAttributes, create: &mut SourceCreate) -> Result<(), ProviderError> {
        let mut source = Source::default();
        self.to_wire(attrs, &mut source)?;
        create.content_type = source.content_type;
        create.paused = source.paused;
        create.scan_interval = source.scan_interval;
        create.third_party_ref = source.third_party_ref;
        Ok(())
    }

    fn to_wire(&self, attrs: &CloudWatchAttributes, source: &mut Source) -> Result<(), ProviderError> {
        source.content_type = Some(PollingContentType::AwsCloudWatch);
        source.paused = Some(attrs.paused);
        source.scan_interval = Some(attrs::parse_scan_interval(&attrs.scan_interval)?);
        source.third_party_ref = Some(ThirdPartyRef::single(ThirdPartyResource {
            service_type: PollingContentType::AwsCloudWatch,
            path: ResourcePath::CloudWatchPath {
                limit_to_regions: attrs.limit_to_regions.clone(),
                limit_to_namespaces: attrs.limit_to_namespaces.clone(),
            },
            authentication: s3_authentication(&attrs.aws_access_key, &attrs.aws_secret_key),
        }));
        Ok(())
    }

    fn from_wire(&self, source: &Source, prior: &CloudWatchAttributes) -> CloudWatchAttributes {
        let resource = source.third_party_ref.as_ref().and_then(ThirdPartyRef::primary);
        let (limit_to_regions, limit_to_namespaces) = match resource.map(|r| &r.path) {
            Some(ResourcePath::CloudWatchPath {
                limit_to_regions,
                limit_to_namespaces,
            }) => (limit_to_regions.clone(), limit_to_namespaces.clone()),
            _ => (Vec::new(), Vec::new()),
        };
        CloudWatchAttributes {
            paused: source.paused.unwrap_or(false),
            scan_interval: stored_scan_interval(source, &prior.scan_interval),
            limit_to_regions,
            limit_to_namespaces,
            aws_access_key: stored_access_key(resource),
            aws_secret_key: prior.aws_secret_key.clone(),
        }
    }
}

// ============================================================================
// Push and file sources
// ============================================================================

/// No attributes beyond the shared ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoAttributes {}

/// `sumologic_syslog_source`: a hosted syslog listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyslogSource;

impl SourceKind for SyslogSource {
    type Attributes = NoAttributes;

    fn type_name(&self) -> &'static str {
        "sumologic_syslog_source"
    }

    fn extend_schema(&self, schema: Schema) -> Schema {
        schema
    }

    fn source_type(&self, _attrs: &NoAttributes) -> Result<SourceType, ProviderError> {
        Ok(SourceType::Cloudsyslog)
    }

    fn matches(&self, source: &Source) -> bool {
        source.source_type == SourceType::Cloudsyslog
    }

    fn to_create(&self, _attrs: &NoAttributes, _create: &mut SourceCreate) -> Result<(), ProviderError> {
        Ok(())
    }

    fn to_wire(&self, _attrs: &NoAttributes, _source: &mut Source) -> Result<(), ProviderError> {
        Ok(())
    }

    fn from_wire(&self, _source: &Source, _prior: &NoAttributes) -> NoAttributes {
        NoAttributes {}
    }
}

/// Attributes of an HTTP source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpAttributes {
    /// Treat every request body as one message.
    pub message_per_request: bool,
    /// Ingestion URL assigned by the server.
    pub url: Option<String>,
}

/// `sumologic_http_source`: an ingestion endpoint with a server-assigned URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpSource;

impl SourceKind for HttpSource {
    type Attributes = HttpAttributes;

    fn type_name(&self) -> &'static str {
        "sumologic_http_source"
    }

    fn extend_schema(&self, schema: Schema) -> Schema {
        schema
            .with_attribute(
                "message_per_request",
                Attribute::optional_bool()
                    .with_default(Value::Bool(false))
                    .with_description("Treat each request body as one message"),
            )
            .with_attribute(
                "url",
                Attribute::computed_string().with_description("Endpoint that receives data"),
            )
    }

    fn source_type(&self, _attrs: &HttpAttributes) -> Result<SourceType, ProviderError> {
        Ok(SourceType::Http)
    }

    fn matches(&self, source: &Source) -> bool {
        source.source_type == SourceType::Http
    }

    fn to_create(&self, attrs: &HttpAttributes, create: &mut SourceCreate) -> Result<(), ProviderError> {
        create.message_per_request = Some(attrs.message_per_request);
        Ok(())
    }

    fn to_wire(&self, attrs: &HttpAttributes, source: &mut Source) -> Result<(), ProviderError> {
        source.message_per_request = Some(attrs.message_per_request);
        Ok(())
    }

    fn from_wire(&self, source: &Source, _prior: &HttpAttributes) -> HttpAttributes {
        HttpAttributes {
            message_per_request: source.message_per_request.unwrap_or(false),
            url: source.url.clone().filter(|u| !u.is_empty()),
        }
    }
}

const DEFAULT_ENCODING: &str = "UTF-8";

/// Attributes of a local file source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalFileAttributes {
    /// Glob of the files to collect.
    pub path_expression: String,
    /// Globs excluded from collection.
    pub blacklist: Vec<String>,
    /// Character encoding of the files.
    pub encoding: String,
}

/// `sumologic_local_file_source`: tails files on an installed collector.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSource;

impl SourceKind for LocalFileSource {
    type Attributes = LocalFileAttributes;

    fn type_name(&self) -> &'static str {
        "sumologic_local_file_source"
    }

    fn extend_schema(&self, schema: Schema) -> Schema {
        schema
            .with_attribute(
                "path_expression",
                Attribute::required_string().with_description("Files to collect, e.g. /var/log/*.log"),
            )
            .with_attribute("blacklist", Attribute::optional_string_list())
            .with_attribute(
                "encoding",
                Attribute::optional_string().with_default(Value::from(DEFAULT_ENCODING)),
            )
    }

    fn source_type(&self, _attrs: &LocalFileAttributes) -> Result<SourceType, ProviderError> {
        Ok(SourceType::LocalFile)
    }

    fn matches(&self, source: &Source) -> bool {
        source.source_type == SourceType::LocalFile
    }

    fn to_create(&self, attrs: &LocalFileAttributes, create: &mut SourceCreate) -> Result<(), ProviderError> {
        create.path_expression = Some(attrs.path_expression.clone());
        Ok(())
    }

    fn to_wire(&self, attrs: &LocalFileAttributes, source: &mut Source) -> Result<(), ProviderError> {
        source.path_expression = Some(attrs.path_expression.clone());
        source.blacklist = attrs.blacklist.clone();
        source.encoding = non_empty(&attrs.encoding);
        Ok(())
    }

    fn from_wire(&self, source: &Source, _prior: &LocalFileAttributes) -> LocalFileAttributes {
        LocalFileAttributes {
            path_expression: source.path_expression.clone().unwrap_or_default(),
            blacklist: source.blacklist.clone(),
            encoding: source
                .encoding
                .clone()
                .unwrap_or_else(|| DEFAULT_ENCODING.to_string()),
        }
    }
}

// ============================================================================
// Generic source
// ============================================================================

/// Attributes of a source of any wire type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericAttributes {
    /// Wire type, e.g. `Syslog`.
    pub source_type: String,
    /// Treat every request body as one message.
    pub message_per_request: Option<bool>,
    /// Glob of the files to collect.
    pub path_expression: Option<String>,
    /// Globs excluded from collection.
    pub blacklist: Vec<String>,
    /// Character encoding of the files.
    pub encoding: Option<String>,
    /// Ingestion URL assigned by the server.
    pub url: Option<String>,
}

/// `sumologic_source`: any non-polling source, typed by `source_type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericSource;

impl GenericSource {
    fn parse_type(raw: &str) -> Result<SourceType, ProviderError> {
        match raw.parse::<SourceType>()? {
            SourceType::Polling => Err(ProviderError::Validation(
                "polling sources are managed by the bucket and cloudwatch source resources"
                    .to_string(),
            )),
            other => Ok(other),
        }
    }
}

impl SourceKind for GenericSource {
    type Attributes = GenericAttributes;

    fn type_name(&self) -> &'static str {
        "sumologic_source"
    }

    fn extend_schema(&self, schema: Schema) -> Schema {
        schema
            .with_attribute(
                "source_type",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("HTTP, Cloudsyslog, LocalFile, RemoteFile or Syslog"),
            )
            .with_attribute("message_per_request", Attribute::optional_computed_bool())
            .with_attribute("path_expression", Attribute::optional_computed_string())
            .with_attribute("blacklist", Attribute::optional_string_list())
            .with_attribute("encoding", Attribute::optional_computed_string())
            .with_attribute("url", Attribute::computed_string())
    }

    fn source_type(&self, attrs: &GenericAttributes) -> Result<SourceType, ProviderError> {
        Self::parse_type(&attrs.source_type)
    }

    fn check(&self, config: &Value, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(raw) = config.get("source_type").and_then(Value::as_str) {
            if let Err(e) = Self::parse_type(raw) {
                diagnostics.push(
                    Diagnostic::error("Invalid source_type")
                        .with_detail(e.message().to_string())
                        .with_attribute("source_type"),
                );
            }
        }
    }

    fn matches(&self, source: &Source) -> bool {
        !matches!(source.source_type, SourceType::Polling | SourceType::Unknown)
    }

    fn to_create(&self, attrs: &GenericAttributes, create: &mut SourceCreate) -> Result<(), ProviderError> {
        create.message_per_request = attrs.message_per_request;
        create.path_expression = attrs.path_expression.clone();
        Ok(())
    }

    fn to_wire(&self, attrs: &GenericAttributes, source: &mut Source) -> Result<(), ProviderError> {
        source.message_per_request = attrs.message_per_request;
        source.path_expression = attrs.path_expression.clone();
        source.blacklist = attrs.blacklist.clone();
        source.encoding = attrs.encoding.clone();
        Ok(())
    }

    fn from_wire(&self, source: &Source, _prior: &GenericAttributes) -> GenericAttributes {
        GenericAttributes {
            source_type: source.source_type.to_string(),
            message_per_request: source.message_per_request,
            path_expression: source.path_expression.clone(),
            blacklist: source.blacklist.clone(),
            encoding: source.encoding.clone(),
            url: source.url.clone().filter(|u| !u.is_empty()),
        }
    }
}
