//! Effective sampling interval of one sensor kind.
//!
//! Every experience may request its own interval per kind. The sensor runs at
//! the fastest interval requested among the experiences currently subscribed,
//! and at the idle interval when nobody is.

use std::collections::HashMap;
use std::time::Duration;

use sensor_common::errors::SensorError;
use sensor_common::types::ExperienceId;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Converts a caller supplied interval in milliseconds.
///
/// Rejects non-positive, NaN and infinite values, and values that round to
/// zero nanoseconds or do not fit in a `Duration`.
pub fn interval_from_millis(interval_ms: f64) -> Result<Duration, SensorError> {
    if !interval_ms.is_finite() || interval_ms <= 0.0 {
        return Err(SensorError::invalid_argument(format!(
            "update interval must be a positive number of milliseconds, got {}",
            interval_ms
        )));
    }
    let nanos = (interval_ms * NANOS_PER_MILLI).round();
    if nanos < 1.0 || nanos >= u64::MAX as f64 {
        return Err(SensorError::invalid_argument(format!(
            "update interval out of range: {} ms",
            interval_ms
        )));
    }
    Ok(Duration::from_nanos(nanos as u64))
}

pub(crate) fn duration_from_millis(interval_ms: f64) -> Duration {
    Duration::from_nanos((interval_ms * NANOS_PER_MILLI).round() as u64)
}

/// Interval requests of one sensor kind, and the value last applied to it.
#[derive(Debug, Clone)]
pub struct IntervalController {
    default_interval: Duration,
    idle_interval: Duration,
    requested: HashMap<ExperienceId, Duration>,
    applied: Duration,
}

impl IntervalController {
    pub fn new(default_interval: Duration, idle_interval: Duration) -> Self {
        Self {
            default_interval,
            idle_interval,
            requested: HashMap::new(),
            applied: idle_interval,
        }
    }

    /// Records the interval `experience_id` wants. Kept until [`IntervalController::forget`],
    /// whether or not the experience is subscribed.
    pub fn request(&mut self, experience_id: ExperienceId, interval: Duration) {
        self.requested.insert(experience_id, interval);
    }

    pub fn requested(&self, experience_id: &ExperienceId) -> Option<Duration> {
        self.requested.get(experience_id).copied()
    }

    pub fn forget(&mut self, experience_id: &ExperienceId) -> Option<Duration> {
        self.requested.remove(experience_id)
    }

    /// Fastest interval requested by `subscribers`, idle interval when empty.
    pub fn effective(&self, subscribers: &[ExperienceId]) -> Duration {
        subscribers
            .iter()
            .map(|experience_id| {
                self.requested(experience_id)
                    .unwrap_or(self.default_interval)
            })
            .min()
            .unwrap_or(self.idle_interval)
    }

    /// Recomputes the effective interval. Returns it only if it differs from
    /// the last applied one, which it then replaces.
    pub fn recompute(&mut self, subscribers: &[ExperienceId]) -> Option<Duration> {
        let effective = self.effective(subscribers);
        if effective == self.applied {
            return None;
        }
        self.applied = effective;
        Some(effective)
    }

    pub fn applied(&self) -> Duration {
        self.applied
    }
}
