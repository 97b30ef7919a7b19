use std::time::{SystemTime, UNIX_EPOCH};

/// Wall clock timestamps in seconds, as used by readings.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Clock(f64);

impl Clock {
    pub fn now() -> Self {
        // a clock set before the epoch reads as zero
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(now.as_secs_f64())
    }

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }
}
