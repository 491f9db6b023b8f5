//! Telemetry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInstall(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
