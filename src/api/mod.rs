//! Client for the collector management REST API.
//!
//! ```ignore
//! use sumologic_provider::api::{Client, Credentials, Session};
//!
//! let session = Session::default()
//!     .with_credentials(Credentials::new("suAbc", "secret"))
//!     .discover()
//!     .await;
//! let client = Client::new(session)?;
//! let collector = client.collectors().get(100772723).await?;
//! let sources = client.sources(collector.id).list(0, 100).await?;
//! ```

pub mod collectors;
pub mod executor;
pub mod model;
pub mod session;
pub mod sources;
pub mod update;

pub use collectors::Collectors;
pub use executor::{ClientExecutor, ClientRequest, ClientResponse};
pub use model::{
    Collector, CollectorCreate, CollectorType, Entity, PollingContentType, ResourceAuthentication,
    ResourcePath, Source, SourceCreate, SourceType, ThirdPartyRef, ThirdPartyResource,
};
pub use session::{Credentials, Session, Transport, DEFAULT_ADDRESS};
pub use sources::Sources;

use serde::Serialize;

use crate::error::ProviderError;

/// Entry point to the API: a session plus the executor built on it.
#[derive(Debug, Clone)]
pub struct Client {
    executor: ClientExecutor,
}

impl Client {
    /// Build a client for the session's endpoint.
    pub fn new(session: Session) -> Result<Self, ProviderError> {
        Ok(Self {
            executor: ClientExecutor::new(session)?,
        })
    }

    /// Toggle request/response dumps.
    pub fn with_debug(self, debug: bool) -> Self {
        Self {
            executor: self.executor.with_debug(debug),
        }
    }

    /// The executor shared by all services.
    pub fn executor(&self) -> &ClientExecutor {
        &self.executor
    }

    /// The session this client was built from.
    pub fn session(&self) -> &Session {
        self.executor.session()
    }

    /// Operations on `/collectors`.
    pub fn collectors(&self) -> Collectors<'_> {
        Collectors::new(&self.executor)
    }

    /// Operations on `/collectors/{collector_id}/sources`.
    pub fn sources(&self, collector_id: u64) -> Sources<'_> {
        Sources::new(&self.executor, collector_id)
    }
}

// Shared CRUD plumbing for entity endpoints.

pub(crate) async fn list_entities<T: Entity>(
    executor: &ClientExecutor,
    path: &str,
    offset: usize,
    limit: usize,
) -> Result<Vec<T>, ProviderError> {
    let mut request = executor.new_request();
    request
        .set_query([("offset", offset), ("limit", limit)])
        .set_endpoint(path)?;
    let body = request.get().await?.json().await?;
    Ok(model::unwrap::<Vec<T>>(T::LIST_KEY, body)?.unwrap_or_default())
}

pub(crate) async fn get_entity<T: Entity>(
    executor: &ClientExecutor,
    path: &str,
) -> Result<T, ProviderError> {
    let mut request = executor.new_request();
    request.set_endpoint(path)?;
    let body = request.get().await?.bytes().await?;
    decode_entity(&body, path)
}

pub(crate) async fn entity_exists(executor: &ClientExecutor, path: &str) -> Result<bool, ProviderError> {
    let mut request = executor.new_request();
    request.set_endpoint(path)?;
    match request.get().await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

pub(crate) async fn create_entity<T: Entity, C: Serialize>(
    executor: &ClientExecutor,
    path: &str,
    payload: &C,
) -> Result<T, ProviderError> {
    let mut request = executor.new_request();
    request
        .set_endpoint(path)?
        .set_json_body(&model::wrap(T::KEY, payload)?)?;
    let body = request.post().await?.bytes().await?;
    decode_entity(&body, path)
}

pub(crate) async fn delete_entity(executor: &ClientExecutor, path: &str) -> Result<(), ProviderError> {
    let mut request = executor.new_request();
    request.set_endpoint(path)?;
    request.delete().await?;
    Ok(())
}

/// Decode an enveloped entity, treating an empty or entity-less success as a
/// contract violation.
fn decode_entity<T: Entity>(body: &[u8], path: &str) -> Result<T, ProviderError> {
    let missing = || ProviderError::ContractViolation(format!("no {} returned from {}", T::KEY, path));
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(missing());
    }
    let envelope: serde_json::Value = serde_json::from_slice(body)?;
    model::unwrap::<T>(T::KEY, envelope)?.ok_or_else(missing)
}
