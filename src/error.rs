//! Error types for the Sumo Logic provider.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes the collector API uses for objects that do not exist.
const NOT_FOUND_CODES: &[&str] = &["InvalidCollector", "InvalidSource"];

/// A structured error returned by the Sumo Logic API for non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("[id={id}] {status} {code} {message}")]
pub struct ApiError {
    /// Opaque request identifier assigned by the service.
    #[serde(default)]
    pub id: String,
    /// HTTP status code.
    #[serde(default)]
    pub status: u16,
    /// Machine-readable error code.
    #[serde(default)]
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// Build an error from a raw response when the body is not a structured error.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            message: body.into(),
            ..Default::default()
        }
    }

    /// Whether this error means the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status == 404 || NOT_FOUND_CODES.contains(&self.code.as_str())
    }

    /// Whether the server rejected a conditional write because the entity changed.
    pub fn is_conflict(&self) -> bool {
        self.status == 409 || self.status == 412
    }
}

/// Errors that can occur while managing Sumo Logic resources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request could not be sent or its response could not be read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The API reported success but did not return what it promised.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Invalid request from client.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// API errors yield the message sent by the service.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Transport(_err) => "transport error (see Debug output)",
            Self::Api(err) => &err.message,
            Self::ContractViolation(msg) => msg,
            Self::Unimplemented(msg) => msg,
            Self::InvalidRequest(msg) => msg,
        }
    }

    /// Whether this error means the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// The structured API error, if this error came from the service.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}
