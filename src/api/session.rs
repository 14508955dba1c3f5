//! Session: base address plus credentials, and the transport built from them.

use std::fmt;

use reqwest::header::LOCATION;
use reqwest::{Method, RequestBuilder, Url};
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Base address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "https://api.sumologic.com/api/v1";

/// Access ID/key pair sent as HTTP Basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_id: String,
    access_key: String,
}

impl Credentials {
    /// Credentials from an access ID and key.
    pub fn new(access_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            access_key: access_key.into(),
        }
    }

    /// The access ID; the key is never exposed.
    pub fn access_id(&self) -> &str {
        &self.access_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("access_key", &"<redacted>")
            .finish()
    }
}

/// An immutable API session.
///
/// Changing the address or credentials yields a new session; anything built
/// from the old one keeps pointing where it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    address: String,
    credentials: Option<Credentials>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

impl Session {
    /// A session against `address` without credentials.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credentials: None,
        }
    }

    /// Base address of the API.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The credentials, if the session is authenticated.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The same session pointed at another base address.
    pub fn with_address(self, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..self
        }
    }

    /// The same session authenticating with other credentials.
    pub fn with_credentials(self, credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..self
        }
    }

    /// Resolve an API path against the base address.
    ///
    /// Exactly one `/` separates the two regardless of how either is spelled.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ProviderError> {
        let joined = format!(
            "{}/{}",
            self.address.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| {
            ProviderError::Configuration(format!("invalid API address {:?}: {}", joined, e))
        })
    }

    /// Build the HTTP transport for this session.
    pub fn create_transport(&self) -> Result<Transport, ProviderError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Transport {
            client,
            credentials: self.credentials.clone(),
        })
    }

    /// Ask the default address which deployment these credentials belong to.
    ///
    /// The API answers a request for its root with a redirect to the regional
    /// deployment. When a `Location` is returned the new session uses it (less
    /// any trailing `/`); on any failure the session is returned unchanged.
    pub async fn discover(self) -> Session {
        match self.try_discover().await {
            Ok(Some(location)) => {
                debug!(from = %self.address, to = %location, "discovered API address");
                self.with_address(location)
            }
            Ok(None) => self,
            Err(e) => {
                warn!(address = %self.address, error = %e, "API address discovery failed");
                self
            }
        }
    }

    async fn try_discover(&self) -> Result<Option<String>, ProviderError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let transport = Transport {
            client,
            credentials: self.credentials.clone(),
        };

        let url = self.endpoint_url("/")?;
        let request = transport.request(Method::GET, url).build()?;
        let response = transport.execute(request).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty());
        Ok(location)
    }
}

/// The shared HTTP client with Basic auth injection.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    credentials: Option<Credentials>,
}

impl Transport {
    /// Start a request with credentials attached.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some(credentials) => {
                builder.basic_auth(&credentials.access_id, Some(&credentials.access_key))
            }
            None => builder,
        }
    }

    /// Send a fully built request.
    pub async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, ProviderError> {
        Ok(self.client.execute(request).await?)
    }
}
