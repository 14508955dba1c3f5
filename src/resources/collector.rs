//! `sumologic_collector` and `sumologic_hosted_collector`.
//!
//! Creation posts the minimal payload, then replaces the new collector with
//! the full configured entity through the conditional update, then reads it
//! back so the state reflects what the API stored.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::attrs::{self, decode_state, encode_state, non_empty, require_id};
use super::ResourceAdapter;
use crate::api::{Client, Collector, CollectorCreate, CollectorType};
use crate::error::ProviderError;
use crate::import::resolve_collector_id;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation;

/// Declarative state of a collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorState {
    /// Server-assigned ID.
    #[serde(with = "attrs::id_string")]
    pub id: Option<u64>,
    /// Display name; unique per account.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Default source category of the collector's sources.
    pub category: String,
    /// `Hosted` or `Installable`; only set on the generic resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector_type: Option<String>,
    /// Version of an installed collector.
    pub version: Option<String>,
    /// Host name of an installed collector.
    pub host_name: Option<String>,
    /// Time zone applied to messages without one.
    pub time_zone: Option<String>,
    /// Whether the collector is removed after 12 hours offline.
    pub ephemeral: Option<bool>,
    /// Whether the collector is currently reporting.
    pub alive: Option<bool>,
    /// Only ingest data newer than this RFC3339 timestamp.
    pub cutoff_timestamp: Option<String>,
    /// Relative cutoff such as `-1d`.
    pub cutoff_relative_time: Option<String>,
    /// CPU usage percentage the collector is throttled to.
    pub target_cpu: Option<i64>,
    /// Architecture of the host.
    pub os_arch: Option<String>,
    /// Operating system version of the host.
    pub os_version: Option<String>,
    /// Operating system name of the host.
    pub os_name: Option<String>,
    /// Clock of the host, in epoch milliseconds.
    pub os_time: Option<i64>,
}

impl CollectorState {
    /// The full entity to store for this state.
    pub fn to_wire(&self, id: u64, collector_type: CollectorType) -> Result<Collector, ProviderError> {
        Ok(Collector {
            id,
            name: self.name.clone(),
            collector_type,
            description: self.description.clone(),
            category: self.category.clone(),
            host_name: self.host_name.clone().unwrap_or_default(),
            time_zone: self.time_zone.clone().unwrap_or_default(),
            ephemeral: self.ephemeral.unwrap_or(false),
            alive: self.alive.unwrap_or(false),
            cutoff_timestamp: attrs::parse_cutoff(self.cutoff_timestamp.as_deref())?,
            cutoff_relative_time: self.cutoff_relative_time.clone().unwrap_or_default(),
            target_cpu: self.target_cpu,
            ..Default::default()
        })
    }

    /// State as reported by the API.
    pub fn from_wire(collector: &Collector, with_type: bool) -> Self {
        Self {
            id: Some(collector.id),
            name: collector.name.clone(),
            description: collector.description.clone(),
            category: collector.category.clone(),
            collector_type: with_type.then(|| collector.collector_type.to_string()),
            version: non_empty(&collector.collector_version),
            host_name: non_empty(&collector.host_name),
            time_zone: non_empty(&collector.time_zone),
            ephemeral: Some(collector.ephemeral),
            alive: Some(collector.alive),
            cutoff_timestamp: attrs::format_cutoff(collector.cutoff_timestamp),
            cutoff_relative_time: non_empty(&collector.cutoff_relative_time),
            target_cpu: collector.target_cpu,
            os_arch: non_empty(&collector.os_arch),
            os_version: non_empty(&collector.os_version),
            os_name: non_empty(&collector.os_name),
            os_time: collector.os_time,
        }
    }
}

/// Adapter for collectors, either of a fixed type or typed by configuration.
#[derive(Debug, Clone)]
pub struct CollectorResource {
    type_name: &'static str,
    fixed_type: Option<CollectorType>,
}

impl CollectorResource {
    /// `sumologic_collector`: the type comes from `collector_type`.
    pub fn generic() -> Self {
        Self {
            type_name: "sumologic_collector",
            fixed_type: None,
        }
    }

    /// `sumologic_hosted_collector`.
    pub fn hosted() -> Self {
        Self {
            type_name: "sumologic_hosted_collector",
            fixed_type: Some(CollectorType::Hosted),
        }
    }

    fn collector_type(&self, state: &CollectorState) -> Result<CollectorType, ProviderError> {
        match (self.fixed_type, state.collector_type.as_deref()) {
            (Some(fixed), _) => Ok(fixed),
            (None, Some(raw)) => raw.parse(),
            (None, None) => Err(ProviderError::Validation(
                "collector_type is required".to_string(),
            )),
        }
    }

    fn decode(&self, value: Value) -> Result<CollectorState, ProviderError> {
        decode_state(&self.schema(), value)
    }

    async fn get(&self, client: &Client, id: u64) -> Result<Collector, ProviderError> {
        client.collectors().get(id).await.map_err(|e| {
            if e.is_not_found() {
                ProviderError::NotFound(format!("collector {}", id))
            } else {
                e
            }
        })
    }

    fn encode(&self, collector: &Collector) -> Result<Value, ProviderError> {
        encode_state(&CollectorState::from_wire(collector, self.fixed_type.is_none()))
    }

    async fn fetch(&self, client: &Client, id: u64) -> Result<Value, ProviderError> {
        let collector = self.get(client, id).await?;
        self.encode(&collector)
    }

    async fn store(&self, client: &Client, id: u64, state: &CollectorState) -> Result<(), ProviderError> {
        let collector = state.to_wire(id, self.collector_type(state)?)?;
        client.collectors().update(&collector).await
    }
}

#[async_trait]
impl ResourceAdapter for CollectorResource {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn schema(&self) -> Schema {
        let mut schema = Schema::v0()
            .with_description("A collector groups sources and owns their ingestion settings")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string().with_default(Value::from("")))
            .with_attribute("category", Attribute::optional_string().with_default(Value::from("")))
            .with_attribute("version", Attribute::computed_string())
            .with_attribute("host_name", Attribute::optional_computed_string())
            .with_attribute("time_zone", Attribute::optional_computed_string())
            .with_attribute("ephemeral", Attribute::optional_computed_bool())
            .with_attribute("alive", Attribute::computed_bool())
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
            .with_attribute(
                "target_cpu",
                Attribute::optional_computed_int64()
                    .with_description("CPU usage percentage the collector is throttled to"),
            )
            .with_attribute("os_arch", Attribute::computed_string())
            .with_attribute("os_version", Attribute::computed_string())
            .with_attribute("os_name", Attribute::computed_string())
            .with_attribute("os_time", Attribute::computed_int64());
        if self.fixed_type.is_none() {
            schema = schema.with_attribute(
                "collector_type",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Hosted or Installable"),
            );
        }
        schema
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        attrs::check_values(config, &mut diagnostics);
        if self.fixed_type.is_none() {
            if let Some(raw) = config.get("collector_type").and_then(Value::as_str) {
                if let Err(e) = raw.parse::<CollectorType>() {
                    diagnostics.push(
                        Diagnostic::error("Invalid collector_type")
                            .with_detail(e.message().to_string())
                            .with_attribute("collector_type"),
                    );
                }
            }
        }
        diagnostics
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        let state = self.decode(planned)?;
        let collector_type = self.collector_type(&state)?;
        // Fail on a bad timestamp before anything is created.
        attrs::parse_cutoff(state.cutoff_timestamp.as_deref())?;

        let created = client
            .collectors()
            .create(&CollectorCreate {
                collector_type,
                name: state.name.clone(),
                description: state.description.clone(),
                category: state.category.clone(),
            })
            .await?;

        let stored = match self.store(client, created.id, &state).await {
            Ok(()) => self.fetch(client, created.id).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &stored {
            // Nothing tracks the new collector yet, so remove it.
            warn!(id = created.id, error = %e, "collector create did not complete, deleting it");
            if let Err(cleanup) = client.collectors().delete(created.id).await {
                warn!(id = created.id, error = %cleanup, "could not delete incomplete collector");
            }
        }
        stored
    }

    async fn read(&self, client: &Client, current: Value) -> Result<Value, ProviderError> {
        let state = self.decode(current)?;
        let id = require_id(state.id, self.type_name)?;
        self.fetch(client, id).await
    }

    async fn update(&self, client: &Client, prior: Value, planned: Value) -> Result<Value, ProviderError> {
        let prior = self.decode(prior)?;
        let state = self.decode(planned)?;
        let id = require_id(state.id.or(prior.id), self.type_name)?;
        self.store(client, id, &state).await?;
        info!(id, resource = self.type_name, "updated collector");
        self.fetch(client, id).await
    }

    async fn delete(&self, client: &Client, current: Value) -> Result<(), ProviderError> {
        let state = self.decode(current)?;
        let id = require_id(state.id, self.type_name)?;
        match client.collectors().delete(id).await {
            Err(e) if e.is_not_found() => {
                debug!(id, "collector already deleted");
                Ok(())
            }
            other => other,
        }
    }

    async fn exists(&self, client: &Client, current: Value) -> Result<bool, ProviderError> {
        let state = self.decode(current)?;
        let id = require_id(state.id, self.type_name)?;
        client.collectors().exists(id).await
    }

    async fn import(&self, client: &Client, identifier: &str) -> Result<Value, ProviderError> {
        let id = resolve_collector_id(client, identifier).await?;
        let collector = self.get(client, id).await?;
        if let Some(expected) = self.fixed_type {
            if collector.collector_type != expected {
                return Err(ProviderError::InvalidRequest(format!(
                    "collector {} is {}, {} only manages {} collectors",
                    id, collector.collector_type, self.type_name, expected
                )));
            }
        }
        self.encode(&collector)
    }
}
