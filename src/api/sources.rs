//! `/collectors/{cid}/sources` endpoint.

use tracing::info;

use super::executor::ClientExecutor;
use super::model::{Source, SourceCreate};
use super::{create_entity, delete_entity, entity_exists, get_entity, list_entities, update};
use crate::error::ProviderError;

/// Source operations scoped to one collector.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    executor: &'a ClientExecutor,
    collector_id: u64,
}

impl<'a> Sources<'a> {
    pub(crate) fn new(executor: &'a ClientExecutor, collector_id: u64) -> Self {
        Self {
            executor,
            collector_id,
        }
    }

    /// The collector these sources belong to.
    pub fn collector_id(&self) -> u64 {
        self.collector_id
    }

    fn base_path(&self) -> String {
        format!("collectors/{}/sources", self.collector_id)
    }

    fn source_path(&self, id: u64) -> String {
        format!("collectors/{}/sources/{}", self.collector_id, id)
    }

    /// One page of the collector's sources.
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Source>, ProviderError> {
        list_entities(self.executor, &self.base_path(), offset, limit).await
    }

    /// Fetch one source.
    pub async fn get(&self, id: u64) -> Result<Source, ProviderError> {
        get_entity(self.executor, &self.source_path(id)).await
    }

    /// Whether the source still exists.
    pub async fn exists(&self, id: u64) -> Result<bool, ProviderError> {
        entity_exists(self.executor, &self.source_path(id)).await
    }

    /// Create a source from the minimal payload.
    pub async fn create(&self, source: &SourceCreate) -> Result<Source, ProviderError> {
        let created: Source = create_entity(self.executor, &self.base_path(), source).await?;
        info!(
            collector_id = self.collector_id,
            id = created.id,
            source_type = %created.source_type,
            "created source"
        );
        Ok(created)
    }

    /// Replace the source, conditional on its current version.
    pub async fn update(&self, source: &Source) -> Result<(), ProviderError> {
        update::conditional_update(self.executor, &self.source_path(source.id), source).await
    }

    /// Delete the source.
    pub async fn delete(&self, id: u64) -> Result<(), ProviderError> {
        delete_entity(self.executor, &self.source_path(id)).await?;
        info!(collector_id = self.collector_id, id, "deleted source");
        Ok(())
    }
}
