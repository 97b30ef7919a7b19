//! Module errors

use thiserror::Error;

use crate::types::{ExperienceId, SensorKind};

/// Represents the different errors raised by the sensor multiplexer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    /// An argument was rejected, e.g. a non-positive update interval.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The platform refused or lost access to the sensor.
    #[error("sensor {kind} unavailable: {reason}")]
    SensorUnavailable { kind: SensorKind, reason: String },

    /// A subscriber callback panicked while handling an event.
    #[error("callback of experience '{experience_id}' failed on {kind}: {message}")]
    CallbackFailure {
        experience_id: ExperienceId,
        kind: SensorKind,
        message: String,
    },

    /// The shared hub behind a binding no longer exists.
    #[error("sensor hub dropped")]
    HubDropped,
}

impl SensorError {
    /// Creates an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a sensor unavailable error
    pub fn unavailable(kind: SensorKind, reason: impl Into<String>) -> Self {
        Self::SensorUnavailable {
            kind,
            reason: reason.into(),
        }
    }
}
