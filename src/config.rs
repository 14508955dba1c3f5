//! Provider configuration.
//!
//! Values come from the provider block of the host configuration; anything
//! left unset falls back to the environment:
//!
//! | Setting      | Environment       |
//! |--------------|-------------------|
//! | `access_id`  | `SUMO_ACCESS_ID`  |
//! | `access_key` | `SUMO_ACCESS_KEY` |
//! | `address`    | `SUMO_ADDRESS`    |
//! | `debug`      | `SUMO_DEBUG=1`    |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{Client, Credentials, Session, DEFAULT_ADDRESS};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Environment fallback for `access_id`.
pub const ENV_ACCESS_ID: &str = "SUMO_ACCESS_ID";
/// Environment fallback for `access_key`.
pub const ENV_ACCESS_KEY: &str = "SUMO_ACCESS_KEY";
/// Environment fallback for `address`.
pub const ENV_ADDRESS: &str = "SUMO_ADDRESS";
/// Enables wire logging when `1`.
pub const ENV_DEBUG: &str = "SUMO_DEBUG";

fn default_discover() -> bool {
    true
}

/// Settings of the provider block.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Access ID of the API key pair.
    #[serde(default)]
    pub access_id: Option<String>,
    /// Access key of the API key pair.
    #[serde(default)]
    pub access_key: Option<String>,
    /// API endpoint; the default deployment when unset.
    #[serde(default)]
    pub address: Option<String>,
    /// Follow the API's redirect to the account's regional deployment.
    #[serde(default = "default_discover")]
    pub discover: bool,
    /// Log every request and response.
    #[serde(default)]
    pub debug: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            access_id: None,
            access_key: None,
            address: None,
            discover: default_discover(),
            debug: false,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("access_id", &self.access_id)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("address", &self.address)
            .field("discover", &self.discover)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ProviderConfig {
    /// The schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "access_id",
                Attribute::optional_string().with_description("Access ID; defaults to SUMO_ACCESS_ID"),
            )
            .with_attribute(
                "access_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Access key; defaults to SUMO_ACCESS_KEY"),
            )
            .with_attribute(
                "address",
                Attribute::optional_string()
                    .with_description("API base address; defaults to SUMO_ADDRESS or the US1 deployment"),
            )
            .with_attribute(
                "discover",
                Attribute::optional_bool()
                    .with_default(Value::Bool(true))
                    .with_description("Follow the redirect to the account's deployment"),
            )
            .with_attribute(
                "debug",
                Attribute::optional_bool()
                    .with_default(Value::Bool(false))
                    .with_description("Dump API requests and responses; also SUMO_DEBUG=1"),
            )
    }

    /// Decode the provider block. A null block is an empty one.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| ProviderError::Configuration(format!("invalid provider configuration: {}", e)))
    }

    /// Fill unset values from the process environment.
    pub fn with_env(self) -> Self {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Fill unset values from `lookup`, which maps environment names to values.
    pub fn resolve_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if is_blank(&self.access_id) {
            self.access_id = env(ENV_ACCESS_ID);
        }
        if is_blank(&self.access_key) {
            self.access_key = env(ENV_ACCESS_KEY);
        }
        if is_blank(&self.address) {
            self.address = env(ENV_ADDRESS);
        }
        if !self.debug {
            self.debug = env(ENV_DEBUG).as_deref() == Some("1");
        }
        self
    }

    /// The configured address, or the default deployment.
    pub fn address(&self) -> &str {
        self.address
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_ADDRESS)
    }

    /// Problems that prevent building a client.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if is_blank(&self.access_id) {
            diagnostics.push(
                Diagnostic::error("Missing access ID")
                    .with_detail(format!("Set access_id or the {} environment variable", ENV_ACCESS_ID))
                    .with_attribute("access_id"),
            );
        }
        if is_blank(&self.access_key) {
            diagnostics.push(
                Diagnostic::error("Missing access key")
                    .with_detail(format!("Set access_key or the {} environment variable", ENV_ACCESS_KEY))
                    .with_attribute("access_key"),
            );
        }
        diagnostics
    }

    /// The resolved key pair. Both halves must be present.
    pub fn credentials(&self) -> Result<Credentials, ProviderError> {
        match (&self.access_id, &self.access_key) {
            (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => {
                Ok(Credentials::new(id.clone(), key.clone()))
            }
            _ => Err(ProviderError::Configuration(
                "access_id and access_key are required".to_string(),
            )),
        }
    }

    /// Build the session, discovering the regional deployment if enabled.
    pub async fn session(&self) -> Result<Session, ProviderError> {
        let session = Session::new(self.address()).with_credentials(self.credentials()?);
        if self.discover {
            Ok(session.discover().await)
        } else {
            Ok(session)
        }
    }

    /// Build a ready-to-use client.
    pub async fn client(&self) -> Result<Client, ProviderError> {
        Ok(Client::new(self.session().await?)?.with_debug(self.debug))
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}
