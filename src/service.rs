//! The provider surface a host drives.
//!
//! A host shim (a plugin server, a CLI, the test harness in
//! [`crate::testing`]) calls these methods with JSON values for configuration
//! and state. [`crate::SumologicProvider`] is the implementation.

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};

/// Trait that provider implementations must implement.
///
/// # Example
///
/// ```ignore
/// use sumologic_provider::{ProviderService, SumologicProvider};
/// use serde_json::json;
///
/// let provider = SumologicProvider::new();
/// provider.configure(json!({"access_id": "suAbc", "access_key": "secret"})).await?;
///
/// let config = json!({"name": "collector1"});
/// let plan = provider.plan("sumologic_hosted_collector", None, config.clone(), config).await?;
/// let state = provider.create("sumologic_hosted_collector", plan.planned_state).await?;
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// The provider block and every resource kind.
    fn schema(&self) -> ProviderSchema;

    /// Derived from the schema unless overridden.
    fn metadata(&self) -> ProviderMetadata {
        let mut resources: Vec<String> = self.schema().resources.keys().cloned().collect();
        resources.sort();
        ProviderMetadata {
            importable: resources.clone(),
            resources,
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Check the provider block without configuring anything.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure credentials and the API address.
    ///
    /// Problems with the configuration come back as error diagnostics; an
    /// `Err` means the provider could not even interpret it.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider. The default does nothing.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate one resource configuration.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Plan a create (`prior_state` is `None`), an update, or a delete
    /// (`proposed_state` is null).
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a resource from its planned state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh state. An object deleted out of band is
    /// [`ProviderError::NotFound`].
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update a resource to its planned state.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Whether the object behind `current_state` still exists.
    async fn exists(&self, resource_type: &str, current_state: Value) -> Result<bool, ProviderError> {
        match self.read(resource_type, current_state).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Bring existing objects under management.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "import not supported for resource type: {}",
            resource_type
        )))
    }
}

/// A failed operation as a single error diagnostic.
pub fn error_to_diagnostics(err: &ProviderError) -> Vec<Diagnostic> {
    let mut diagnostic = Diagnostic::error(err.to_string());
    if let Some(api) = err.api_error() {
        if !api.code.is_empty() {
            diagnostic = diagnostic.with_detail(format!("{} (request {})", api.code, api.id));
        }
    }
    vec![diagnostic]
}
