//! Telemetry for veil services.
//!
//! Logging is the only observability surface: structured `tracing` events,
//! pretty-printed in development and JSON in production.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
