//! An in-memory stand-in for the collector management API.
//!
//! Mounted on a wiremock server as a catch-all responder. It keeps
//! collectors and sources in a shared store, versions every entity with an
//! ETag and enforces `If-Match` on PUT, so the provider's real request
//! sequence runs end to end.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};
use sumologic_provider::testing::ProviderTester;
use sumologic_provider::SumologicProvider;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const API_PREFIX: &str = "/api/v1";

/// Fields the server owns; client writes never change them.
const SERVER_FIELDS: &[&str] = &["alive", "url", "lastSeenAlive", "collectorVersion"];

#[derive(Debug, Clone)]
struct Versioned {
    body: Value,
    version: u64,
}

impl Versioned {
    fn new(body: Value) -> Self {
        Self { body, version: 1 }
    }

    fn etag(&self) -> String {
        format!("\"v{}\"", self.version)
    }
}

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    collectors: BTreeMap<u64, Versioned>,
    sources: BTreeMap<u64, BTreeMap<u64, Versioned>>,
}

impl Store {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        100_000 + self.next_id
    }

    fn insert_collector(&mut self, mut body: Map<String, Value>) -> Value {
        let id = self.allocate();
        body.insert("id".to_string(), json!(id));
        body.insert("alive".to_string(), json!(true));
        let body = Value::Object(body);
        self.collectors.insert(id, Versioned::new(body.clone()));
        self.sources.insert(id, BTreeMap::new());
        body
    }

    fn insert_source(&mut self, collector_id: u64, mut body: Map<String, Value>) -> Value {
        let id = self.allocate();
        body.insert("id".to_string(), json!(id));
        strip_secrets(&mut body);
        if body.get("sourceType") == Some(&json!("HTTP")) {
            body.insert(
                "url".to_string(),
                json!(format!("https://endpoint1.collection.fake.sumologic.com/receiver/v1/http/{}", id)),
            );
        }
        let body = Value::Object(body);
        self.sources
            .entry(collector_id)
            .or_default()
            .insert(id, Versioned::new(body.clone()));
        body
    }
}

/// Shared handle to the fake API state.
#[derive(Debug, Clone, Default)]
pub struct FakeSumo {
    store: Arc<Mutex<Store>>,
}

impl FakeSumo {
    /// Start a server with the fake mounted under [`API_PREFIX`].
    pub async fn start() -> (MockServer, Self) {
        let server = MockServer::start().await;
        let fake = Self::default();
        Mock::given(any()).respond_with(fake.clone()).mount(&server).await;
        (server, fake)
    }

    /// Add a collector directly, bypassing the API.
    pub fn seed_collector(&self, name: &str) -> u64 {
        let mut body = Map::new();
        body.insert("name".to_string(), json!(name));
        body.insert("collectorType".to_string(), json!("Hosted"));
        body.insert("description".to_string(), json!(""));
        body.insert("category".to_string(), json!(""));
        let created = self.store.lock().unwrap().insert_collector(body);
        created["id"].as_u64().unwrap()
    }

    /// Add a source directly, bypassing the API.
    pub fn seed_source(&self, collector_id: u64, body: Value) -> u64 {
        let body = body.as_object().cloned().unwrap_or_default();
        let created = self.store.lock().unwrap().insert_source(collector_id, body);
        created["id"].as_u64().unwrap()
    }

    pub fn collector(&self, id: u64) -> Option<Value> {
        self.store
            .lock()
            .unwrap()
            .collectors
            .get(&id)
            .map(|v| v.body.clone())
    }

    pub fn source(&self, collector_id: u64, id: u64) -> Option<Value> {
        self.store
            .lock()
            .unwrap()
            .sources
            .get(&collector_id)
            .and_then(|sources| sources.get(&id))
            .map(|v| v.body.clone())
    }

    /// Current version number of a source.
    pub fn source_version(&self, collector_id: u64, id: u64) -> Option<u64> {
        self.store
            .lock()
            .unwrap()
            .sources
            .get(&collector_id)
            .and_then(|sources| sources.get(&id))
            .map(|v| v.version)
    }

    /// Delete a collector out of band.
    pub fn remove_collector(&self, id: u64) {
        let mut store = self.store.lock().unwrap();
        store.collectors.remove(&id);
        store.sources.remove(&id);
    }
}

impl Store {
    fn collector_mut(&mut self, raw: &str) -> Option<&mut Versioned> {
        self.collectors.get_mut(&parse_id(raw)?)
    }

    fn sources_of(&self, raw: &str) -> Option<&BTreeMap<u64, Versioned>> {
        self.sources.get(&parse_id(raw)?)
    }

    fn source_mut(&mut self, cid: &str, id: &str) -> Option<&mut Versioned> {
        let id = parse_id(id)?;
        self.sources.get_mut(&parse_id(cid)?)?.get_mut(&id)
    }

    fn remove_collector(&mut self, raw: &str) -> Option<Versioned> {
        let id = parse_id(raw)?;
        self.sources.remove(&id);
        self.collectors.remove(&id)
    }

    fn remove_source(&mut self, cid: &str, id: &str) -> Option<Versioned> {
        let id = parse_id(id)?;
        self.sources.get_mut(&parse_id(cid)?)?.remove(&id)
    }
}

impl Respond for FakeSumo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Some(path) = request.url.path().strip_prefix(API_PREFIX) else {
            return error(404, "NotFound", "unknown path");
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut guard = self.store.lock().unwrap();
        let store = &mut *guard;

        match (request.method.as_str(), segments.as_slice()) {
            ("GET", ["collectors"]) => {
                let all: Vec<Value> = store.collectors.values().map(|v| v.body.clone()).collect();
                ResponseTemplate::new(200).set_body_json(json!({"collectors": page(request, all)}))
            }
            ("POST", ["collectors"]) => match envelope(request, "collector") {
                Some(body) => {
                    let created = store.insert_collector(body);
                    ResponseTemplate::new(201).set_body_json(json!({"collector": created}))
                }
                None => error(400, "BadRequest", "missing collector"),
            },
            ("GET", ["collectors", id]) => match store.collector_mut(id) {
                Some(entry) => with_etag(entry, "collector"),
                None => error(404, "InvalidCollector", "collector does not exist"),
            },
            ("PUT", ["collectors", id]) => match store.collector_mut(id) {
                Some(entry) => replace(entry, request, "collector"),
                None => error(404, "InvalidCollector", "collector does not exist"),
            },
            ("DELETE", ["collectors", id]) => match store.remove_collector(id) {
                Some(_) => ResponseTemplate::new(200),
                None => error(404, "InvalidCollector", "collector does not exist"),
            },
            ("GET", ["collectors", cid, "sources"]) => match store.sources_of(cid) {
                Some(sources) => {
                    let all: Vec<Value> = sources.values().map(|v| v.body.clone()).collect();
                    ResponseTemplate::new(200).set_body_json(json!({"sources": page(request, all)}))
                }
                None => error(404, "InvalidCollector", "collector does not exist"),
            },
            ("POST", ["collectors", cid, "sources"]) => {
                let Some(cid) = parse_id(cid).filter(|cid| store.collectors.contains_key(cid)) else {
                    return error(404, "InvalidCollector", "collector does not exist");
                };
                match envelope(request, "source") {
                    Some(body) => {
                        let created = store.insert_source(cid, body);
                        ResponseTemplate::new(201).set_body_json(json!({"source": created}))
                    }
                    None => error(400, "BadRequest", "missing source"),
                }
            }
            ("GET", ["collectors", cid, "sources", id]) => match store.source_mut(cid, id) {
                Some(entry) => with_etag(entry, "source"),
                None => error(404, "InvalidSource", "source does not exist"),
            },
            ("PUT", ["collectors", cid, "sources", id]) => match store.source_mut(cid, id) {
                Some(entry) => replace(entry, request, "source"),
                None => error(404, "InvalidSource", "source does not exist"),
            },
            ("DELETE", ["collectors", cid, "sources", id]) => match store.remove_source(cid, id) {
                Some(_) => ResponseTemplate::new(200),
                None => error(404, "InvalidSource", "source does not exist"),
            },
            _ => error(405, "MethodNotAllowed", "unsupported route"),
        }
    }
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.parse().ok()
}

fn error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "id": "FAKE-REQ",
        "status": status,
        "code": code,
        "message": message,
    }))
}

fn envelope(request: &Request, key: &str) -> Option<Map<String, Value>> {
    let body: Value = serde_json::from_slice(&request.body).ok()?;
    body.get(key)?.as_object().cloned()
}

fn page(request: &Request, all: Vec<Value>) -> Vec<Value> {
    let mut offset = 0;
    let mut limit = usize::MAX;
    for (key, value) in request.url.query_pairs() {
        match key.as_ref() {
            "offset" => offset = value.parse().unwrap_or(0),
            "limit" => limit = value.parse().unwrap_or(usize::MAX),
            _ => {}
        }
    }
    all.into_iter().skip(offset).take(limit).collect()
}

fn wrap(key: &str, entity: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert(key.to_string(), entity);
    Value::Object(envelope)
}

fn with_etag(entry: &Versioned, key: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("ETag", entry.etag().as_str())
        .set_body_json(wrap(key, entry.body.clone()))
}

/// Conditional replace: `If-Match` must name the current version.
fn replace(entry: &mut Versioned, request: &Request, key: &str) -> ResponseTemplate {
    let if_match = request
        .headers
        .get("If-Match")
        .and_then(|v| v.to_str().ok());
    if if_match != Some(entry.etag().as_str()) {
        return error(412, "PreconditionFailed", "entity has changed");
    }
    let Some(mut body) = envelope(request, key) else {
        return error(400, "BadRequest", "missing entity");
    };
    body.insert("id".to_string(), entry.body["id"].clone());
    for field in SERVER_FIELDS {
        body.remove(*field);
        if let Some(value) = entry.body.get(*field) {
            body.insert(field.to_string(), value.clone());
        }
    }
    strip_secrets(&mut body);
    entry.body = Value::Object(body);
    entry.version += 1;
    ResponseTemplate::new(200).set_body_json(wrap(key, entry.body.clone()))
}

/// The API accepts `awsKey` but never stores it where reads can see it.
fn strip_secrets(body: &mut Map<String, Value>) {
    if let Some(resources) = body
        .get_mut("thirdPartyRef")
        .and_then(|r| r.get_mut("resources"))
        .and_then(Value::as_array_mut)
    {
        for resource in resources {
            if let Some(auth) = resource.get_mut("authentication").and_then(Value::as_object_mut) {
                auth.remove("awsKey");
            }
        }
    }
}

/// Provider block pointing at the fake.
pub fn provider_config(server: &MockServer) -> Value {
    json!({
        "access_id": "suTestAccessId",
        "access_key": "test-access-key",
        "address": format!("{}{}", server.uri(), API_PREFIX),
        "discover": false,
    })
}

/// A configured harness plus the fake behind it.
pub async fn harness() -> (MockServer, FakeSumo, ProviderTester<SumologicProvider>) {
    let (server, fake) = FakeSumo::start().await;
    let tester = ProviderTester::new(SumologicProvider::new().with_env(|_| None));
    tester
        .configure(provider_config(&server))
        .await
        .expect("provider configures against the fake API");
    (server, fake, tester)
}

/// Numeric ID out of a state's string `id`.
pub fn state_id(state: &Value) -> u64 {
    state["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .unwrap_or_else(|| panic!("state has no numeric id: {}", state))
}
