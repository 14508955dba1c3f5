//! Sumo Logic provider
//!
//! Manages Sumo Logic collectors and their log sources declaratively, on top
//! of the collector management REST API.
//!
//! # Overview
//!
//! - **API client** ([`api`]): session, request executor, collector and
//!   source endpoints, and the ETag/If-Match update protocol
//! - **Resources** ([`resources`]): one adapter per declarative resource
//!   kind, translating state to API calls
//! - **Import** ([`import`]): resolving `<id-or-name>` and
//!   `<collector>:<source>` identifiers
//! - **Provider** ([`SumologicProvider`]): the [`ProviderService`]
//!   implementation a host drives (configure, validate, plan, CRUD, import)
//! - **Schema and validation** ([`schema`], [`validation`])
//! - **Logging** ([`logging`]): `tracing` with wire dumps on a dedicated target
//!
//! # Quick Start
//!
//! ```ignore
//! use sumologic_provider::{ProviderService, SumologicProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     sumologic_provider::init_logging();
//!
//!     // Credentials fall back to SUMO_ACCESS_ID / SUMO_ACCESS_KEY.
//!     let provider = SumologicProvider::new();
//!     provider.configure(json!({})).await?;
//!
//!     let config = json!({"name": "collector1", "description": "managed"});
//!     let plan = provider
//!         .plan("sumologic_hosted_collector", None, config.clone(), config)
//!         .await?;
//!     let collector = provider
//!         .create("sumologic_hosted_collector", plan.planned_state)
//!         .await?;
//!
//!     let collector_id: u64 = collector["id"].as_str().unwrap_or_default().parse()?;
//!     let config = json!({"collector_id": collector_id, "name": "http"});
//!     let source = provider.create("sumologic_http_source", config).await?;
//!     println!("send logs to {}", source["url"]);
//!     Ok(())
//! }
//! ```
//!
//! # Resource kinds
//!
//! | Type | Notes |
//! |------|-------|
//! | `sumologic_collector` | `collector_type` forces replacement |
//! | `sumologic_hosted_collector` | |
//! | `sumologic_cloudtrail_source`, `sumologic_cloudfront_source`, `sumologic_elb_source`, `sumologic_s3_source`, `sumologic_s3_audit_source` | S3 bucket polling |
//! | `sumologic_cloudwatch_source` | CloudWatch polling |
//! | `sumologic_syslog_source` | |
//! | `sumologic_http_source` | computed `url` |
//! | `sumologic_local_file_source` | installed collectors only |
//! | `sumologic_source` | `source_type` forces replacement |
//!
//! Collectors import by ID or name; sources by
//! `<collector-id-or-name>:<source-id-or-name>`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod duration;
pub mod error;
pub mod import;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod timestamp;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use api::{Client, Credentials, Session};
pub use config::ProviderConfig;
pub use error::{ApiError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::SumologicProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
