//! Capabilities the host platform injects to give access to physical sensors.

use std::sync::Weak;
use std::time::Duration;

use crate::constants::STANDARD_GRAVITY;
use crate::errors::SensorError;
use crate::types::{Reading, SensorKind};

/// Receives what a started sensor produces. Implemented by the dispatcher.
///
/// `generation` identifies the `start` call the data belongs to, so data
/// produced by a sensor that was since stopped or restarted can be discarded.
pub trait ReadingReceiver: Send + Sync {
    fn on_reading(&self, generation: u64, reading: Reading);
    fn on_failure(&self, generation: u64, reason: String);
}

/// Handle handed to the platform on `start`, used to push readings back.
///
/// Holds a weak reference: once the receiver is gone, pushes are ignored.
#[derive(Clone)]
pub struct ReadingSink {
    kind: SensorKind,
    generation: u64,
    receiver: Weak<dyn ReadingReceiver>,
}

impl ReadingSink {
    pub fn new(kind: SensorKind, generation: u64, receiver: Weak<dyn ReadingReceiver>) -> Self {
        Self {
            kind,
            generation,
            receiver,
        }
    }

    /// Sink that discards everything, for platforms driven without a hub.
    pub fn detached(kind: SensorKind) -> Self {
        let receiver: Weak<dyn ReadingReceiver> = Weak::<NoopReceiver>::new();
        Self::new(kind, 0, receiver)
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pushes a reading. Returns false if nobody is listening anymore.
    pub fn deliver(&self, reading: Reading) -> bool {
        match self.receiver.upgrade() {
            Some(receiver) => {
                receiver.on_reading(self.generation, reading);
                true
            }
            None => false,
        }
    }

    /// Reports that the sensor stopped working after a successful start.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        match self.receiver.upgrade() {
            Some(receiver) => {
                receiver.on_failure(self.generation, reason.into());
                true
            }
            None => false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.receiver.strong_count() > 0
    }
}

impl std::fmt::Debug for ReadingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingSink")
            .field("kind", &self.kind)
            .field("generation", &self.generation)
            .field("connected", &self.is_connected())
            .finish()
    }
}

struct NoopReceiver;

impl ReadingReceiver for NoopReceiver {
    fn on_reading(&self, _generation: u64, _reading: Reading) {}
    fn on_failure(&self, _generation: u64, _reason: String) {}
}

/// Platform sensor access, one implementation covering every sensor kind.
///
/// Contract:
/// - `start` reports failure through its return value, never through the sink.
/// - `stop` must not wait for in-flight deliveries to finish: it may be
///   called from inside a subscriber callback.
/// - readings pushed to one sink must be ordered by timestamp, and pushed
///   from one thread at a time.
pub trait PlatformSensor: Send + Sync {
    /// Acquires the sensor and starts pushing readings to `sink` every `interval`.
    fn start(
        &self,
        kind: SensorKind,
        interval: Duration,
        sink: ReadingSink,
    ) -> Result<(), SensorError>;

    /// Changes the sampling interval of a started sensor.
    fn set_interval(&self, kind: SensorKind, interval: Duration);

    /// Stops the sensor and releases the underlying handle.
    fn stop(&self, kind: SensorKind);

    /// Gravity magnitude measured by the device, in m/s^2.
    fn gravity(&self) -> f64 {
        STANDARD_GRAVITY
    }
}
