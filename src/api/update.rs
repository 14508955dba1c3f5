//! Optimistic concurrency for entity updates.
//!
//! The API versions every entity with an `ETag`. A write must echo the tag
//! of the version it was based on in `If-Match`; the server rejects it if the
//! entity changed in between. No retry happens here: a conflict surfaces as
//! [`ProviderError::Api`] and the caller decides.

use reqwest::header::{ETAG, IF_MATCH};
use tracing::debug;

use super::executor::ClientExecutor;
use super::model::{wrap, Entity};
use crate::error::ProviderError;

/// Fetch the current `ETag` of the entity at `path`.
pub async fn fetch_etag(executor: &ClientExecutor, path: &str) -> Result<String, ProviderError> {
    let mut request = executor.new_request();
    request.set_endpoint(path)?;
    let response = request.get().await?;
    response
        .header(ETAG.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::ContractViolation(format!("no ETag returned for {}", path))
        })
}

/// Replace the entity at `path` with `entity`, conditional on its current version.
pub async fn conditional_update<T: Entity>(
    executor: &ClientExecutor,
    path: &str,
    entity: &T,
) -> Result<(), ProviderError> {
    let etag = fetch_etag(executor, path).await?;
    debug!(path, etag = %etag, "updating {}", T::KEY);

    let mut request = executor.new_request();
    request
        .set_endpoint(path)?
        .set_request_header(IF_MATCH.as_str(), &etag)?
        .set_json_body(&wrap(T::KEY, entity)?)?;
    request.put().await?;
    Ok(())
}
