//! State of the physical sensor behind one sensor kind.

use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sensor_common::errors::SensorError;
use sensor_common::traits::{PlatformSensor, ReadingSink};
use sensor_common::types::SensorKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceState {
    /// Not running. Produces nothing.
    Idle,
    /// Started on the platform and pushing readings.
    Active,
    /// The platform refused or lost the sensor. Stays here until reset.
    Unavailable(String),
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceState::Idle => write!(f, "idle"),
            SourceState::Active => write!(f, "active"),
            SourceState::Unavailable(reason) => write!(f, "unavailable ({})", reason),
        }
    }
}

/// Drives the platform sensor of one kind through Idle, Active and Unavailable.
///
/// Every transition is idempotent: starting an active source or stopping an
/// idle one does not reach the platform.
pub struct SensorSource {
    kind: SensorKind,
    platform: Arc<dyn PlatformSensor>,
    state: SourceState,
    interval: Duration,
}

impl SensorSource {
    pub fn new(kind: SensorKind, platform: Arc<dyn PlatformSensor>, interval: Duration) -> Self {
        Self {
            kind,
            platform,
            state: SourceState::Idle,
            interval,
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SourceState::Active
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts the platform sensor at `interval`, pushing to `sink`.
    ///
    /// Returns true if the platform was started by this call. A refusal
    /// leaves the source Unavailable and is returned as `SensorUnavailable`,
    /// as is any start attempted while Unavailable.
    pub fn start(&mut self, interval: Duration, sink: ReadingSink) -> Result<bool, SensorError> {
        match &self.state {
            SourceState::Active => Ok(false),
            SourceState::Unavailable(reason) => {
                Err(SensorError::unavailable(self.kind, reason.clone()))
            }
            SourceState::Idle => {
                self.interval = interval;
                match self.platform.start(self.kind, interval, sink) {
                    Ok(()) => {
                        info!("Started {} sensor every {:?}", self.kind, interval);
                        self.state = SourceState::Active;
                        Ok(true)
                    }
                    Err(err) => {
                        let reason = match err {
                            SensorError::SensorUnavailable { reason, .. } => reason,
                            other => other.to_string(),
                        };
                        warn!("Could not start {} sensor: {}", self.kind, reason);
                        self.state = SourceState::Unavailable(reason.clone());
                        Err(SensorError::unavailable(self.kind, reason))
                    }
                }
            }
        }
    }

    /// Stops the platform sensor. Returns true if it was running.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.platform.stop(self.kind);
        self.state = SourceState::Idle;
        info!("Stopped {} sensor", self.kind);
        true
    }

    /// Records the interval to sample at. Returns true if it was forwarded to
    /// the platform, which only happens while Active.
    pub fn set_interval(&mut self, interval: Duration) -> bool {
        if interval == self.interval {
            return false;
        }
        self.interval = interval;
        if !self.is_active() {
            return false;
        }
        debug!("Changing {} sampling interval to {:?}", self.kind, interval);
        self.platform.set_interval(self.kind, interval);
        true
    }

    /// Moves to Unavailable after a runtime failure, stopping the platform
    /// sensor if it was running.
    pub fn mark_unavailable(&mut self, reason: &str) {
        if self.is_active() {
            self.platform.stop(self.kind);
        }
        warn!("{} sensor unavailable: {}", self.kind, reason);
        self.state = SourceState::Unavailable(reason.to_string());
    }

    /// Returns an Unavailable source to Idle so it may be started again.
    pub fn reset(&mut self) -> bool {
        if !matches!(self.state, SourceState::Unavailable(_)) {
            return false;
        }
        info!("Resetting {} sensor", self.kind);
        self.state = SourceState::Idle;
        true
    }
}

impl fmt::Debug for SensorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorSource")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("interval", &self.interval)
            .finish()
    }
}
