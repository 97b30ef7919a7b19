use dashmap::DashMap;
use std::sync::Mutex;
use std::time::Duration;

use sensor_common::constants::STANDARD_GRAVITY;
use sensor_common::errors::SensorError;
use sensor_common::traits::{PlatformSensor, ReadingSink};
use sensor_common::types::{Reading, SensorKind, XYZ};

/// Call received by a [`ManualPlatform`].
#[derive(Clone, Debug, PartialEq)]
pub enum PlatformCall {
    Start(SensorKind, Duration),
    SetInterval(SensorKind, Duration),
    Stop(SensorKind),
}

/// Platform driven by hand: it records every call and only produces
/// readings when the test pushes them with [`ManualPlatform::emit`].
pub struct ManualPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    sinks: DashMap<SensorKind, ReadingSink>,
    missing: DashMap<SensorKind, String>,
    gravity: f64,
}

impl Default for ManualPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualPlatform {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sinks: DashMap::new(),
            missing: DashMap::new(),
            gravity: STANDARD_GRAVITY,
        }
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Makes `start` fail for `kind`, as if the hardware were absent.
    pub fn with_missing(self, kind: SensorKind, reason: &str) -> Self {
        self.set_missing(kind, reason);
        self
    }

    pub fn set_missing(&self, kind: SensorKind, reason: &str) {
        self.missing.insert(kind, reason.to_string());
    }

    pub fn clear_missing(&self, kind: SensorKind) {
        self.missing.remove(&kind);
    }

    /// Sink handed over by the last successful start of `kind`, if still running.
    pub fn sink(&self, kind: SensorKind) -> Option<ReadingSink> {
        // cloned out so no map lock is held while delivering
        self.sinks.get(&kind).map(|entry| entry.value().clone())
    }

    /// Pushes `reading` to the running sensor of its kind. Returns false if
    /// the sensor is not running.
    pub fn emit(&self, reading: Reading) -> bool {
        match self.sink(reading.kind()) {
            Some(sink) => sink.deliver(reading),
            None => false,
        }
    }

    pub fn emit_vector(&self, kind: SensorKind, timestamp: f64, data: [f64; 3]) -> bool {
        match Reading::vector(kind, timestamp, XYZ::new(data)) {
            Ok(reading) => self.emit(reading),
            Err(_) => false,
        }
    }

    /// Simulates the sensor being lost while running.
    pub fn fail(&self, kind: SensorKind, reason: &str) -> bool {
        match self.sink(kind) {
            Some(sink) => sink.fail(reason),
            None => false,
        }
    }

    pub fn is_running(&self, kind: SensorKind) -> bool {
        self.sinks.contains_key(&kind)
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, kind: SensorKind) -> Vec<PlatformCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                PlatformCall::Start(k, _) | PlatformCall::SetInterval(k, _) | PlatformCall::Stop(k) => {
                    *k == kind
                }
            })
            .collect()
    }

    pub fn interval_changes(&self, kind: SensorKind) -> Vec<Duration> {
        self.calls_for(kind)
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::SetInterval(_, interval) => Some(interval),
                _ => None,
            })
            .collect()
    }

    pub fn start_count(&self, kind: SensorKind) -> usize {
        self.calls_for(kind)
            .iter()
            .filter(|call| matches!(call, PlatformCall::Start(..)))
            .count()
    }

    pub fn stop_count(&self, kind: SensorKind) -> usize {
        self.calls_for(kind)
            .iter()
            .filter(|call| matches!(call, PlatformCall::Stop(_)))
            .count()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PlatformSensor for ManualPlatform {
    fn start(
        &self,
        kind: SensorKind,
        interval: Duration,
        sink: ReadingSink,
    ) -> Result<(), SensorError> {
        if let Some(reason) = self.missing.get(&kind) {
            return Err(SensorError::unavailable(kind, reason.value().clone()));
        }
        self.record(PlatformCall::Start(kind, interval));
        self.sinks.insert(kind, sink);
        Ok(())
    }

    fn set_interval(&self, kind: SensorKind, interval: Duration) {
        self.record(PlatformCall::SetInterval(kind, interval));
    }

    fn stop(&self, kind: SensorKind) {
        self.record(PlatformCall::Stop(kind));
        self.sinks.remove(&kind);
    }

    fn gravity(&self) -> f64 {
        self.gravity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls() {
        let platform = ManualPlatform::new();
        let interval = Duration::from_millis(50);
        platform
            .start(SensorKind::Gyroscope, interval, ReadingSink::detached(SensorKind::Gyroscope))
            .unwrap();
        platform.set_interval(SensorKind::Gyroscope, Duration::from_millis(20));
        platform.stop(SensorKind::Gyroscope);

        assert_eq!(
            platform.calls(),
            vec![
                PlatformCall::Start(SensorKind::Gyroscope, interval),
                PlatformCall::SetInterval(SensorKind::Gyroscope, Duration::from_millis(20)),
                PlatformCall::Stop(SensorKind::Gyroscope),
            ]
        );
        assert!(!platform.is_running(SensorKind::Gyroscope));
    }

    #[test]
    fn test_missing_sensor_fails_to_start() {
        let platform = ManualPlatform::new().with_missing(SensorKind::Magnetometer, "no chip");
        let result = platform.start(
            SensorKind::Magnetometer,
            Duration::from_millis(100),
            ReadingSink::detached(SensorKind::Magnetometer),
        );
        assert_eq!(
            result,
            Err(SensorError::unavailable(SensorKind::Magnetometer, "no chip"))
        );
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_emit_without_running_sensor() {
        let platform = ManualPlatform::new();
        assert!(!platform.emit_vector(SensorKind::Accelerometer, 0.0, [0.0, 0.0, 1.0]));
        assert!(!platform.fail(SensorKind::Accelerometer, "gone"));
    }
}
