use std::sync::Arc;
use std::time::Duration;

use sensor_common::constants::{DEFAULT_UPDATE_INTERVAL_MS, IDLE_INTERVAL_MS};
use sensor_common::errors::SensorError;

use crate::interval::{duration_from_millis, interval_from_millis};

/// Receives every error caught by the hub that cannot be returned to a caller:
/// failing callbacks and sensors lost while running.
pub type ErrorReporter = Arc<dyn Fn(&SensorError) + Send + Sync>;

/// Configuration of a [`crate::SensorHub`].
#[derive(Clone)]
pub struct HubConfig {
    default_interval: Duration,
    idle_interval: Duration,
    error_reporter: Option<ErrorReporter>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            default_interval: duration_from_millis(DEFAULT_UPDATE_INTERVAL_MS),
            idle_interval: duration_from_millis(IDLE_INTERVAL_MS),
            error_reporter: None,
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interval requested by a subscription whose experience never set one.
    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = interval;
        self
    }

    /// Same as [`HubConfig::with_default_interval`], in milliseconds.
    pub fn with_default_interval_millis(self, interval_ms: f64) -> Result<Self, SensorError> {
        Ok(self.with_default_interval(interval_from_millis(interval_ms)?))
    }

    /// Interval reported for a sensor kind nobody is subscribed to.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    pub fn with_error_reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(&SensorError) + Send + Sync + 'static,
    {
        self.error_reporter = Some(Arc::new(reporter));
        self
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    pub fn idle_interval(&self) -> Duration {
        self.idle_interval
    }

    pub fn error_reporter(&self) -> Option<ErrorReporter> {
        self.error_reporter.clone()
    }

    /// Checks the configured intervals are usable.
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.default_interval.is_zero() {
            return Err(SensorError::invalid_argument(
                "default update interval must be greater than zero",
            ));
        }
        if self.idle_interval.is_zero() {
            return Err(SensorError::invalid_argument(
                "idle update interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConfig")
            .field("default_interval", &self.default_interval)
            .field("idle_interval", &self.idle_interval)
            .field("error_reporter", &self.error_reporter.is_some())
            .finish()
    }
}
