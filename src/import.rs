//! Resolution of import identifiers to numeric IDs.
//!
//! Collectors import as `<id-or-name>`, sources as
//! `<collector-id-or-name>:<source-id-or-name>`. Numeric identifiers are
//! taken verbatim; names are looked up by paging through the listing.

use std::future::Future;

use tracing::debug;

use crate::api::{Client, Collector, Entity, Source};
use crate::error::ProviderError;

/// Listing page size used for name lookups.
pub const PAGE_SIZE: usize = 100;

/// Name lookups give up after this many listed items.
pub const MAX_ITEMS: usize = 10_000;

/// Find the first entity for which `matches` holds, paging through `fetch`.
///
/// A page shorter than [`PAGE_SIZE`] is taken to be the last one.
pub async fn scan_pages<T, F, Fut>(
    mut fetch: F,
    mut matches: impl FnMut(&T) -> bool,
) -> Result<Option<T>, ProviderError>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ProviderError>>,
{
    let mut offset = 0;
    while offset < MAX_ITEMS {
        let page = fetch(offset, PAGE_SIZE).await?;
        let len = page.len();
        if let Some(found) = page.into_iter().find(|item| matches(item)) {
            return Ok(Some(found));
        }
        if len < PAGE_SIZE {
            break;
        }
        offset += PAGE_SIZE;
    }
    Ok(None)
}

fn check_identifier<'a>(kind: &str, identifier: &'a str) -> Result<&'a str, ProviderError> {
    if identifier.is_empty() {
        return Err(ProviderError::InvalidRequest(format!("empty {} identifier", kind)));
    }
    Ok(identifier)
}

/// Resolve a collector ID or name.
pub async fn resolve_collector_id(client: &Client, identifier: &str) -> Result<u64, ProviderError> {
    let identifier = check_identifier("collector", identifier)?;
    if let Ok(id) = identifier.parse::<u64>() {
        return Ok(id);
    }

    let collectors = client.collectors();
    let found = scan_pages(
        |offset, limit| async move { collectors.list(offset, limit).await },
        |collector: &Collector| collector.name() == identifier,
    )
    .await?;

    match found {
        Some(collector) => {
            debug!(name = identifier, id = collector.id(), "resolved collector by name");
            Ok(collector.id())
        }
        None => Err(ProviderError::NotFound(format!(
            "no collector named {:?}",
            identifier
        ))),
    }
}

/// Resolve a source ID or name within a collector.
pub async fn resolve_source_id(
    client: &Client,
    collector_id: u64,
    identifier: &str,
) -> Result<u64, ProviderError> {
    let identifier = check_identifier("source", identifier)?;
    if let Ok(id) = identifier.parse::<u64>() {
        return Ok(id);
    }

    let sources = client.sources(collector_id);
    let found = scan_pages(
        |offset, limit| async move { sources.list(offset, limit).await },
        |source: &Source| source.name() == identifier,
    )
    .await?;

    match found {
        Some(source) => {
            debug!(collector_id, name = identifier, id = source.id(), "resolved source by name");
            Ok(source.id())
        }
        None => Err(ProviderError::NotFound(format!(
            "no source named {:?} in collector {}",
            identifier, collector_id
        ))),
    }
}

/// Split `<collector>:<source>`.
pub fn split_source_identifier(token: &str) -> Result<(&str, &str), ProviderError> {
    match token.split_once(':') {
        Some((collector, source)) if !collector.is_empty() && !source.is_empty() => {
            Ok((collector, source))
        }
        _ => Err(ProviderError::InvalidRequest(format!(
            "source identifier {:?} must look like <collector>:<source>",
            token
        ))),
    }
}

/// Resolve `<collector>:<source>` to `(collector_id, source_id)`.
pub async fn resolve_source_identifier(
    client: &Client,
    token: &str,
) -> Result<(u64, u64), ProviderError> {
    let (collector, source) = split_source_identifier(token)?;
    let collector_id = resolve_collector_id(client, collector).await?;
    let source_id = resolve_source_id(client, collector_id, source).await?;
    Ok((collector_id, source_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Session;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Client {
        Client::new(Session::new(format!("{}/api/v1", server.uri()))).unwrap()
    }

    fn collectors_page(start: usize, count: usize) -> Value {
        let collectors: Vec<Value> = (start..start + count)
            .map(|i| json!({"id": i + 1, "name": format!("collector-{}", i)}))
            .collect();
        json!({ "collectors": collectors })
    }

    #[tokio::test]
    async fn test_integer_identifier_skips_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collectors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"collectors": []})))
            .expect(0)
            .mount(&server)
            .await;

        assert_eq!(resolve_collector_id(&client(&server), "12345").await.unwrap(), 12345);
    }

    #[tokio::test]
    async fn test_name_found_on_second_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collectors"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collectors_page(0, 100)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collectors"))
            .and(query_param("offset", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collectors_page(100, 100)))
            .expect(1)
            .mount(&server)
            .await;

        let id = resolve_collector_id(&client(&server), "collector-142").await.unwrap();
        assert_eq!(id, 143);
    }

    #[tokio::test]
    async fn test_short_page_ends_scan() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collectors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collectors_page(0, 3)))
            .expect(1)
            .mount(&server)
            .await;

        let err = resolve_collector_id(&client(&server), "missing").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scan_stops_at_item_cap() {
        let calls = AtomicUsize::new(0);
        let found = scan_pages(
            |offset, limit| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, ProviderError>((offset..offset + limit).collect::<Vec<_>>()) }
            },
            |item: &usize| *item == usize::MAX,
        )
        .await
        .unwrap();

        assert!(found.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ITEMS / PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let found = scan_pages(
            |_, _| async { Ok::<_, ProviderError>(vec![("dup", 1), ("dup", 2)]) },
            |item: &(&str, u64)| item.0 == "dup",
        )
        .await
        .unwrap();
        assert_eq!(found, Some(("dup", 1)));
    }

    #[tokio::test]
    async fn test_names_match_case_sensitively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collectors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collectors_page(0, 5)))
            .mount(&server)
            .await;

        let err = resolve_collector_id(&client(&server), "COLLECTOR-1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_source_identifier_resolution() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collectors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "collectors": [{"id": 10, "name": "hosted"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collectors/10/sources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sources": [{"id": 20, "name": "http", "sourceType": "HTTP"}]
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(
            resolve_source_identifier(&client, "hosted:http").await.unwrap(),
            (10, 20)
        );
        assert_eq!(
            resolve_source_identifier(&client, "10:99").await.unwrap(),
            (10, 99)
        );
    }

    #[test]
    fn test_malformed_source_identifiers() {
        for bad in ["", "10", ":5", "10:", "nocolon"] {
            let err = split_source_identifier(bad).unwrap_err();
            assert!(matches!(err, ProviderError::InvalidRequest(_)), "{:?}", bad);
        }
        assert_eq!(split_source_identifier("a:b:c").unwrap(), ("a", "b:c"));
    }
}
