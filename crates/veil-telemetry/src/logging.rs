//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, EnvFilter};

/// Filter applied when `RUST_LOG` is absent.
const DEFAULT_DIRECTIVES: &str = "info,veil=debug";

/// Install the global tracing subscriber.
///
/// The record format follows the runtime environment: JSON lines under
/// `RUST_ENV=production` (with span context attached to every record),
/// human-readable output everywhere else. `RUST_LOG` overrides the default
/// filter of info plus debug for the veil crates.
pub fn init_logging() -> TelemetryResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let production = matches!(std::env::var("RUST_ENV").as_deref(), Ok("production"));

    let installed = if production {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .try_init()
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .try_init()
    };

    installed.map_err(|e| TelemetryError::SubscriberInstall(e.to_string()))
}
