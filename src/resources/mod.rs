//! Resource adapters: declarative state on one side, API calls on the other.
//!
//! Each resource kind implements [`ResourceAdapter`]. The provider looks the
//! adapter up by type name in a [`Registry`] and hands it the configured
//! [`Client`].

pub mod attrs;
pub mod collector;
pub mod source;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{Client, PollingContentType};
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::validation;

pub use collector::CollectorResource;
pub use source::{
    BucketSource, CloudWatchSource, GenericSource, HttpSource, LocalFileSource, SourceKind,
    SourceResource, SyslogSource,
};

/// Lifecycle of one resource kind.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Declarative type name, e.g. `sumologic_http_source`.
    fn type_name(&self) -> &'static str;

    /// Schema of the resource's configuration and state.
    fn schema(&self) -> Schema;

    /// Presence, type and value checks of a configuration.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Create the object and return its state as read back from the API.
    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh the state. A vanished object is [`ProviderError::NotFound`].
    async fn read(&self, client: &Client, current: Value) -> Result<Value, ProviderError>;

    /// Apply the planned state and return it as read back.
    async fn update(&self, client: &Client, prior: Value, planned: Value) -> Result<Value, ProviderError>;

    /// Delete the object. Deleting one that is already gone succeeds.
    async fn delete(&self, client: &Client, current: Value) -> Result<(), ProviderError>;

    /// Whether the object still exists.
    async fn exists(&self, client: &Client, current: Value) -> Result<bool, ProviderError>;

    /// Resolve an import identifier and return the object's state.
    async fn import(&self, client: &Client, identifier: &str) -> Result<Value, ProviderError>;
}

/// Adapters by type name.
#[derive(Clone, Default)]
pub struct Registry {
    adapters: BTreeMap<&'static str, Arc<dyn ResourceAdapter>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.adapters.keys()).finish()
    }
}

impl Registry {
    /// A registry of every resource this provider manages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every resource kind this crate provides.
    pub fn builtin() -> Self {
        Self::new()
            .with(CollectorResource::generic())
            .with(CollectorResource::hosted())
            .with(SourceResource::new(BucketSource::new(
                "sumologic_cloudtrail_source",
                PollingContentType::AwsCloudTrailBucket,
            )))
            .with(SourceResource::new(BucketSource::new(
                "sumologic_cloudfront_source",
                PollingContentType::AwsCloudFrontBucket,
            )))
            .with(SourceResource::new(BucketSource::new(
                "sumologic_elb_source",
                PollingContentType::AwsElbBucket,
            )))
            .with(SourceResource::new(BucketSource::new(
                "sumologic_s3_source",
                PollingContentType::AwsS3Bucket,
            )))
            .with(SourceResource::new(BucketSource::new(
                "sumologic_s3_audit_source",
                PollingContentType::AwsS3AuditBucket,
            )))
            .with(SourceResource::new(CloudWatchSource))
            .with(SourceResource::new(SyslogSource))
            .with(SourceResource::new(HttpSource))
            .with(SourceResource::new(LocalFileSource))
            .with(SourceResource::new(GenericSource))
    }

    /// Add an adapter, replacing one with the same type name.
    pub fn with(mut self, adapter: impl ResourceAdapter + 'static) -> Self {
        self.adapters.insert(adapter.type_name(), Arc::new(adapter));
        self
    }

    /// The adapter for `type_name`.
    pub fn get(&self, type_name: &str) -> Result<&Arc<dyn ResourceAdapter>, ProviderError> {
        self.adapters
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    /// Type names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.keys().copied()
    }

    /// All adapters, ordered by type name.
    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn ResourceAdapter>> {
        self.adapters.values()
    }
}
