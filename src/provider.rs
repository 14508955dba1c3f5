//! [`SumologicProvider`]: dispatch to resource adapters, and planning.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::api::Client;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::resources::{Registry, ResourceAdapter};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::types::{AttributeChange, ImportedResource, PlanResult};
use crate::validation;

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// The Sumo Logic provider.
///
/// Unconfigured until [`ProviderService::configure`] succeeds; resource
/// operations before that fail with [`ProviderError::Configuration`].
/// Reconfiguring replaces the client wholesale.
pub struct SumologicProvider {
    client: RwLock<Option<Arc<Client>>>,
    registry: Registry,
    env: EnvLookup,
}

impl fmt::Debug for SumologicProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SumologicProvider")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Default for SumologicProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SumologicProvider {
    /// A provider with every built-in resource kind.
    pub fn new() -> Self {
        Self::with_registry(Registry::builtin())
    }

    /// A provider serving the given adapters.
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            client: RwLock::new(None),
            registry,
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replace the environment lookup used for configuration fallbacks.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        self.env = Arc::new(lookup);
        self
    }

    /// The adapters this provider serves.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configured client.
    pub async fn client(&self) -> Result<Arc<Client>, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Configuration("provider is not configured".to_string()))
    }

    /// Whether `configure` has succeeded.
    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    fn adapter(&self, resource_type: &str) -> Result<&Arc<dyn ResourceAdapter>, ProviderError> {
        self.registry.get(resource_type)
    }

    fn resolve_config(&self, config: Value) -> Result<ProviderConfig, ProviderError> {
        let env = self.env.as_ref();
        Ok(ProviderConfig::from_value(config)?.resolve_with(|key: &str| env(key)))
    }
}

#[async_trait::async_trait]
impl ProviderService for SumologicProvider {
    fn schema(&self) -> ProviderSchema {
        self.registry.adapters().fold(
            ProviderSchema::new().with_provider_config(ProviderConfig::schema()),
            |schema, adapter| schema.with_resource(adapter.type_name(), adapter.schema()),
        )
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if !diagnostics.iter().any(Diagnostic::is_error) {
            diagnostics.extend(self.resolve_config(config)?.diagnostics());
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(diagnostics = diagnostics.len(), "provider configuration is invalid");
            return Ok(diagnostics);
        }

        let config = self.resolve_config(config)?;
        diagnostics.extend(config.diagnostics());
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(diagnostics = diagnostics.len(), "provider configuration is incomplete");
            return Ok(diagnostics);
        }

        let client = config.client().await?;
        info!(
            address = client.session().address(),
            debug = config.debug,
            "provider configured"
        );
        *self.client.write().await = Some(Arc::new(client));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        info!("provider stopped");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.adapter(resource_type)?.validate(&config))
    }

    #[instrument(skip(self, prior_state, proposed_state, config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.adapter(resource_type)?.schema();
        let desired = if config.is_null() { proposed_state } else { config };

        let result = match (prior_state, desired) {
            (None, Value::Null) => {
                return Err(ProviderError::InvalidRequest(
                    "nothing to plan without prior or proposed state".to_string(),
                ))
            }
            (None, desired) => plan_create(&schema, desired)?,
            (Some(prior), Value::Null) => plan_delete(prior)?,
            (Some(prior), desired) => plan_update(&schema, prior, desired)?,
        };
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "planned"
        );
        Ok(result)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let adapter = self.adapter(resource_type)?;
        let client = self.client().await?;
        let state = adapter.create(&client, planned_state).await?;
        info!(id = %state["id"], "created");
        Ok(state)
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let adapter = self.adapter(resource_type)?;
        let client = self.client().await?;
        adapter.read(&client, current_state).await
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let adapter = self.adapter(resource_type)?;
        let client = self.client().await?;
        adapter.update(&client, prior_state, planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let adapter = self.adapter(resource_type)?;
        let client = self.client().await?;
        let id = current_state["id"].clone();
        adapter.delete(&client, current_state).await?;
        info!(%id, "deleted");
        Ok(())
    }

    #[instrument(skip(self, current_state))]
    async fn exists(&self, resource_type: &str, current_state: Value) -> Result<bool, ProviderError> {
        let adapter = self.adapter(resource_type)?;
        let client = self.client().await?;
        adapter.exists(&client, current_state).await
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let adapter = self.adapter(resource_type)?;
        let client = self.client().await?;
        let state = adapter.import(&client, id).await?;
        info!(id = %state["id"], "imported");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}

// ============================================================================
// Planning
// ============================================================================

fn into_object(value: Value, what: &str) -> Result<Map<String, Value>, ProviderError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ProviderError::InvalidRequest(format!(
            "{} must be an object, got {}",
            what, other
        ))),
    }
}

fn present(map: &Map<String, Value>, name: &str) -> Option<Value> {
    map.get(name).filter(|v| !v.is_null()).cloned()
}

/// Every configured attribute is added; computed ones stay unknown.
pub fn plan_create(schema: &Schema, config: Value) -> Result<PlanResult, ProviderError> {
    let mut planned = into_object(config, "configuration")?;
    schema.apply_defaults(&mut planned);
    planned.retain(|_, v| !v.is_null());

    let changes = planned
        .iter()
        .map(|(name, value)| AttributeChange::added(name.clone(), value.clone()))
        .collect();
    Ok(PlanResult::with_changes(Value::Object(planned), changes, false))
}

/// Configurable attributes come from configuration; computed values the
/// configuration leaves unset are carried from prior state.
pub fn plan_update(schema: &Schema, prior: Value, config: Value) -> Result<PlanResult, ProviderError> {
    let prior = into_object(prior, "prior state")?;
    let mut config = into_object(config, "configuration")?;
    schema.apply_defaults(&mut config);

    let mut planned = Map::new();
    let mut changes = Vec::new();

    for (name, attr) in &schema.block.attributes {
        let before = present(&prior, name);
        if attr.is_computed_only() {
            if let Some(value) = before {
                planned.insert(name.clone(), value);
            }
            continue;
        }
        let after = match present(&config, name) {
            Some(value) => Some(value),
            None if attr.flags.computed => before.clone(),
            None => None,
        };
        record_change(&mut changes, name, before, after.clone());
        if let Some(value) = after {
            planned.insert(name.clone(), value);
        }
    }

    // Nested blocks are optional and computed: an unset block keeps what the
    // API reported.
    for name in schema.block.blocks.keys() {
        let before = present(&prior, name);
        let after = present(&config, name).or_else(|| before.clone());
        record_change(&mut changes, name, before, after.clone());
        if let Some(value) = after {
            planned.insert(name.clone(), value);
        }
    }

    changes.sort_by(|a, b| a.path.cmp(&b.path));
    let force_new = schema.force_new_paths();
    let requires_replace = changes.iter().any(|c| force_new.contains(&c.path.as_str()));
    Ok(PlanResult::with_changes(Value::Object(planned), changes, requires_replace))
}

/// Every attribute of the prior state is removed.
pub fn plan_delete(prior: Value) -> Result<PlanResult, ProviderError> {
    let prior = into_object(prior, "prior state")?;
    let changes = prior
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(name, value)| AttributeChange::removed(name, value))
        .collect();
    Ok(PlanResult::with_changes(Value::Null, changes, false))
}

fn record_change(changes: &mut Vec<AttributeChange>, name: &str, before: Option<Value>, after: Option<Value>) {
    match (before, after) {
        (Some(before), Some(after)) if before != after => {
            changes.push(AttributeChange::modified(name, before, after))
        }
        (None, Some(after)) => changes.push(AttributeChange::added(name, after)),
        (Some(before), None) => changes.push(AttributeChange::removed(name, before)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{CollectorResource, HttpSource, SourceResource};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn http_schema() -> Schema {
        SourceResource::new(HttpSource).schema()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_plan_create_applies_defaults() {
        let plan = plan_create(&http_schema(), json!({"collector_id": 42, "name": "http"})).unwrap();
        assert_eq!(plan.planned_state["message_per_request"], false);
        assert_eq!(plan.planned_state["description"], "");
        assert!(plan.planned_state.get("url").is_none());
        assert!(plan.change("name").is_some());
        assert!(!plan.requires_replace);
    }

    #[test]
    fn test_plan_update_carries_computed_values() {
        let prior = json!({
            "id": "7",
            "collector_id": 42,
            "name": "http",
            "description": "",
            "category": "",
            "time_zone": "UTC",
            "message_per_request": false,
            "url": "https://endpoint.example/receiver/v1/http/abc"
        });
        let plan = plan_update(&http_schema(), prior.clone(), json!({"collector_id": 42, "name": "http"})).unwrap();
        assert!(!plan.has_changes(), "{:?}", plan.changes);
        assert_eq!(plan.planned_state, prior);

        let plan = plan_update(
            &http_schema(),
            prior,
            json!({"collector_id": 42, "name": "http", "category": "web", "time_zone": "Etc/UTC"}),
        )
        .unwrap();
        let paths: Vec<_> = plan.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["category", "time_zone"]);
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["id"], "7");
    }

    #[test]
    fn test_plan_update_replaces_on_force_new_change() {
        let prior = json!({"id": "7", "collector_id": 42, "name": "http", "description": "", "category": ""});
        let plan = plan_update(&http_schema(), prior, json!({"collector_id": 43, "name": "http"})).unwrap();
        assert!(plan.requires_replace);
        assert_eq!(
            plan.change("collector_id"),
            Some(&AttributeChange::modified("collector_id", json!(42), json!(43)))
        );

        let schema = CollectorResource::generic().schema();
        let prior = json!({"id": "1", "name": "c", "collector_type": "Hosted", "description": "", "category": ""});
        let plan = plan_update(&schema, prior, json!({"name": "c", "collector_type": "Installable"})).unwrap();
        assert!(plan.requires_replace);
    }

    #[test]
    fn test_plan_update_removes_unset_optional() {
        let schema = crate::resources::SourceResource::new(crate::resources::LocalFileSource).schema();
        let prior = json!({
            "id": "3", "collector_id": 1, "name": "files", "description": "", "category": "",
            "path_expression": "/var/log/*.log", "blacklist": ["/var/log/secure"], "encoding": "UTF-8"
        });
        let plan = plan_update(
            &schema,
            prior,
            json!({"collector_id": 1, "name": "files", "path_expression": "/var/log/*.log"}),
        )
        .unwrap();
        assert_eq!(
            plan.changes,
            vec![AttributeChange::removed("blacklist", json!(["/var/log/secure"]))]
        );
    }

    #[test]
    fn test_plan_delete() {
        let plan = plan_delete(json!({"id": "7", "name": "http", "host": null})).unwrap();
        assert_eq!(plan.planned_state, Value::Null);
        assert_eq!(plan.changes.len(), 2);
        assert!(plan.changes.iter().all(|c| c.after.is_none()));
    }

    #[tokio::test]
    async fn test_plan_dispatch() {
        let provider = SumologicProvider::new().with_env(no_env);
        let plan = provider
            .plan("sumologic_hosted_collector", None, Value::Null, json!({"name": "c"}))
            .await
            .unwrap();
        assert!(plan.has_changes());

        let plan = provider
            .plan("sumologic_hosted_collector", Some(json!({"id": "1"})), Value::Null, Value::Null)
            .await
            .unwrap();
        assert_eq!(plan.planned_state, Value::Null);

        let err = provider
            .plan("sumologic_dashboard", None, Value::Null, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_rejects_operations() {
        let provider = SumologicProvider::new().with_env(no_env);
        let err = provider
            .create("sumologic_hosted_collector", json!({"name": "c"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_reports_missing_credentials() {
        let provider = SumologicProvider::new().with_env(no_env);
        let diagnostics = provider.configure(json!({"discover": false})).await.unwrap();
        let attributes: Vec<_> = diagnostics.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attributes, vec!["access_id", "access_key"]);
        assert!(!provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_configure_from_env_and_stop() {
        let provider = SumologicProvider::new().with_env(|key| match key {
            "SUMO_ACCESS_ID" => Some("suAbc".to_string()),
            "SUMO_ACCESS_KEY" => Some("secret".to_string()),
            _ => None,
        });
        let diagnostics = provider
            .configure(json!({"address": "http://127.0.0.1:9/api/v1", "discover": false}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(provider.client().await.unwrap().session().address(), "http://127.0.0.1:9/api/v1");

        provider.stop().await.unwrap();
        assert!(!provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_configure_rejects_wrong_types() {
        let provider = SumologicProvider::new().with_env(no_env);
        let diagnostics = provider.configure(json!({"discover": "yes"})).await.unwrap();
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("discover"));
    }

    #[test]
    fn test_schema_lists_every_resource() {
        let schema = SumologicProvider::new().schema();
        assert_eq!(schema.resources.len(), 12);
        assert!(schema.provider.attribute("access_key").unwrap().flags.sensitive);
        let secret = schema.resources["sumologic_s3_source"].attribute("aws_secret_key").unwrap();
        assert!(secret.flags.sensitive);
    }
}
