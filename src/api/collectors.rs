//! `/collectors` endpoint.

use tracing::info;

use super::executor::ClientExecutor;
use super::model::{Collector, CollectorCreate};
use super::{create_entity, delete_entity, entity_exists, get_entity, list_entities, update};
use crate::error::ProviderError;

const COLLECTORS: &str = "collectors";

fn collector_path(id: u64) -> String {
    format!("{}/{}", COLLECTORS, id)
}

/// Collector operations.
#[derive(Debug, Clone, Copy)]
pub struct Collectors<'a> {
    executor: &'a ClientExecutor,
}

impl<'a> Collectors<'a> {
    pub(crate) fn new(executor: &'a ClientExecutor) -> Self {
        Self { executor }
    }

    /// One page of collectors.
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Collector>, ProviderError> {
        list_entities(self.executor, COLLECTORS, offset, limit).await
    }

    /// Fetch one collector.
    pub async fn get(&self, id: u64) -> Result<Collector, ProviderError> {
        get_entity(self.executor, &collector_path(id)).await
    }

    /// `false` when the collector does not exist; other failures propagate.
    pub async fn exists(&self, id: u64) -> Result<bool, ProviderError> {
        entity_exists(self.executor, &collector_path(id)).await
    }

    /// Create a collector from the minimal payload.
    pub async fn create(&self, collector: &CollectorCreate) -> Result<Collector, ProviderError> {
        let created: Collector = create_entity(self.executor, COLLECTORS, collector).await?;
        info!(id = created.id, name = %created.name, "created collector");
        Ok(created)
    }

    /// Replace the collector's mutable fields, conditional on its current version.
    pub async fn update(&self, collector: &Collector) -> Result<(), ProviderError> {
        update::conditional_update(self.executor, &collector_path(collector.id), collector).await
    }

    /// Delete the collector and, server-side, all of its sources.
    pub async fn delete(&self, id: u64) -> Result<(), ProviderError> {
        delete_entity(self.executor, &collector_path(id)).await?;
        info!(id, "deleted collector");
        Ok(())
    }
}
