//! Logging and tracing setup.
//!
//! Everything the provider logs goes through `tracing`. Output is written to
//! **stderr** so that a host shim remains free to use stdout for its own
//! handshake.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter (e.g. `info`, `sumologic_provider=debug`)
//! - `SUMO_DEBUG=1`: dump every API request/response on the
//!   [`WIRE_TARGET`] target at debug level
//!
//! ```bash
//! # Lifecycle logging only
//! RUST_LOG=info ./host
//!
//! # Full request/response dumps
//! SUMO_DEBUG=1 RUST_LOG=info,sumologic_provider::wire=debug ./host
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tracing target used for request/response dumps.
pub const WIRE_TARGET: &str = "sumologic_provider::wire";

fn filter_or(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Install the global subscriber, defaulting to `info` when `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Install the global subscriber with a custom default level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(filter_or(default_level))
        .with(stderr_layer())
        .init();
}

/// Try to install the global subscriber.
///
/// Returns `false` instead of panicking when one is already installed, which
/// makes it safe to call from every test.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(filter_or("info"))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}
