//! Request builder and executor.
//!
//! A [`ClientRequest`] accumulates endpoint, query, headers and body, then is
//! consumed by one of the verb methods. Non-2xx responses become
//! [`ProviderError::Api`]; successful ones come back as a [`ClientResponse`]
//! whose body can be read exactly once.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::session::{Session, Transport};
use crate::error::{ApiError, ProviderError};
use crate::logging::WIRE_TARGET;

/// Executes requests for one session over one shared transport.
#[derive(Debug, Clone)]
pub struct ClientExecutor {
    session: Session,
    transport: Transport,
    debug: bool,
}

impl ClientExecutor {
    /// Build an executor and its transport from a session.
    pub fn new(session: Session) -> Result<Self, ProviderError> {
        let transport = session.create_transport()?;
        Ok(Self {
            session,
            transport,
            debug: false,
        })
    }

    /// Dump every request and response on the wire log target.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The session requests are made for.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start a new request against this executor's session.
    pub fn new_request(&self) -> ClientRequest<'_> {
        ClientRequest {
            executor: self,
            url: None,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// A request under construction.
#[derive(Debug)]
pub struct ClientRequest<'a> {
    executor: &'a ClientExecutor,
    url: Option<Url>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl<'a> ClientRequest<'a> {
    /// Point the request at an API path. A query set earlier is kept.
    pub fn set_endpoint(&mut self, path: &str) -> Result<&mut Self, ProviderError> {
        self.url = Some(self.executor.session.endpoint_url(path)?);
        Ok(self)
    }

    /// Replace the query string.
    pub fn set_query<K, V>(&mut self, params: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.query = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        self
    }

    /// Add or overwrite one header.
    pub fn set_request_header(&mut self, key: &str, value: &str) -> Result<&mut Self, ProviderError> {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ProviderError::InvalidRequest(format!("invalid header name {:?}: {}", key, e)))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ProviderError::InvalidRequest(format!("invalid value for header {}: {}", key, e))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Serialize `body` as the JSON request body.
    pub fn set_json_body<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<&mut Self, ProviderError> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Send the request as a GET.
    pub async fn get(self) -> Result<ClientResponse, ProviderError> {
        self.send(Method::GET).await
    }

    /// Send the request as a POST.
    pub async fn post(self) -> Result<ClientResponse, ProviderError> {
        self.send(Method::POST).await
    }

    /// Send the request as a PUT.
    pub async fn put(self) -> Result<ClientResponse, ProviderError> {
        self.send(Method::PUT).await
    }

    /// Send the request as a DELETE.
    pub async fn delete(self) -> Result<ClientResponse, ProviderError> {
        self.send(Method::DELETE).await
    }

    async fn send(self, method: Method) -> Result<ClientResponse, ProviderError> {
        let executor = self.executor;
        let mut url = self
            .url
            .ok_or_else(|| ProviderError::InvalidRequest("request endpoint not set".to_string()))?;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut builder = executor.transport.request(method, url).headers(self.headers);
        if let Some(body) = self.body {
            builder = builder.body(body);
        }
        let request = builder.build()?;

        debug!(method = %request.method(), url = %request.url(), "sending API request");
        if executor.debug {
            dump_request(&request);
        }

        let response = executor.transport.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            let body = response.bytes().await?;
            if executor.debug {
                dump_response(status, &headers, &body);
            }
            return Err(decode_api_error(status, &body).into());
        }

        let body = if executor.debug {
            let body = response.bytes().await?.to_vec();
            dump_response(status, &headers, &body);
            ResponseBody::Buffered(body)
        } else {
            ResponseBody::Pending(response)
        };

        Ok(ClientResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decode a structured error body, falling back to status plus raw text.
fn decode_api_error(status: StatusCode, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(mut err) => {
            if err.status == 0 {
                err.status = status.as_u16();
            }
            err
        }
        Err(_) => ApiError::from_status(status.as_u16(), String::from_utf8_lossy(body)),
    }
}

fn dump_request(request: &reqwest::Request) {
    let headers = request
        .headers()
        .iter()
        .map(|(name, value)| {
            if name == AUTHORIZATION {
                format!("{}: <redacted>", name)
            } else {
                format!("{}: {}", name, value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let body = request
        .body()
        .and_then(|b| b.as_bytes())
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default();
    debug!(
        target: WIRE_TARGET,
        "{} {}\n{}\n\n{}",
        request.method(),
        request.url(),
        headers,
        body
    );
}

fn dump_response(status: StatusCode, headers: &HeaderMap, body: &[u8]) {
    let headers = headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect::<Vec<_>>()
        .join("\n");
    debug!(
        target: WIRE_TARGET,
        "{}\n{}\n\n{}",
        status,
        headers,
        String::from_utf8_lossy(body)
    );
}

#[derive(Debug)]
enum ResponseBody {
    Pending(reqwest::Response),
    Buffered(Vec<u8>),
}

/// A successful response. Body accessors consume it.
#[derive(Debug)]
pub struct ClientResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl ClientResponse {
    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// A response header as text, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Consume the response into its raw body.
    pub async fn bytes(self) -> Result<Vec<u8>, ProviderError> {
        match self.body {
            ResponseBody::Pending(response) => Ok(response.bytes().await?.to_vec()),
            ResponseBody::Buffered(body) => Ok(body),
        }
    }

    /// Consume the response into a UTF-8 body.
    pub async fn text(self) -> Result<String, ProviderError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Consume the response and decode its JSON body.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ProviderError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn executor(server: &MockServer) -> ClientExecutor {
        ClientExecutor::new(Session::new(format!("{}/api/v1", server.uri()))).unwrap()
    }

    #[tokio::test]
    async fn test_query_survives_endpoint_change() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collectors"))
            .and(query_param("offset", "100"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"collectors": []})))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor(&server).await;
        let mut request = executor.new_request();
        request.set_query([("offset", 100), ("limit", 50)]);
        request.set_endpoint("collectors").unwrap();
        let body: Value = request.get().await.unwrap().json().await.unwrap();
        assert_eq!(body, json!({"collectors": []}));
    }

    #[tokio::test]
    async fn test_json_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/collectors/1"))
            .and(header("content-type", "application/json"))
            .and(header("if-match", "\"v1\""))
            .and(body_json(json!({"collector": {"id": 1}})))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"v2\""))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor(&server).await;
        let mut request = executor.new_request();
        request
            .set_endpoint("collectors/1")
            .unwrap()
            .set_request_header("If-Match", "\"v1\"")
            .unwrap()
            .set_json_body(&json!({"collector": {"id": 1}}))
            .unwrap();
        let response = request.put().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.header("etag"), Some("\"v2\""));
    }

    #[tokio::test]
    async fn test_structured_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": 404,
                "id": "Q1W2E",
                "code": "collectors.invalid",
                "message": "The requested collector ID is invalid."
            })))
            .mount(&server)
            .await;

        let executor = executor(&server).await;
        let mut request = executor.new_request();
        request.set_endpoint("collectors/42").unwrap();
        let err = request.get().await.unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.id, "Q1W2E");
        assert_eq!(api.code, "collectors.invalid");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unstructured_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let executor = executor(&server).await;
        let mut request = executor.new_request();
        request.set_endpoint("collectors/42").unwrap();
        let err = request.delete().await.unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.status, 502);
        assert_eq!(api.message, "bad gateway");
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_rejected() {
        let server = MockServer::start().await;
        let executor = executor(&server).await;
        let err = executor.new_request().get().await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_debug_mode_buffers_without_changing_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let executor = executor(&server).await.with_debug(true);
        let mut request = executor.new_request();
        request.set_endpoint("/").unwrap();
        assert_eq!(request.get().await.unwrap().text().await.unwrap(), "hello");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let executor = ClientExecutor::new(Session::default()).unwrap();
        let mut request = executor.new_request();
        assert!(request.set_request_header("If-Match", "bad\nvalue").is_err());
    }
}
