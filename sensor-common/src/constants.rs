/// Number of coordinates in a 3-axis measurement.
pub const N_XYZ_COORDINATES: usize = 3;

/// Number of distinct sensor kinds handled by the multiplexer.
pub const N_SENSOR_KINDS: usize = 5;

/// Standard gravity in m/s^2.
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Interval requested by a subscription that never called `set_update_interval`.
pub const DEFAULT_UPDATE_INTERVAL_MS: f64 = 100.0;

/// Interval reported for a sensor kind without subscribers.
pub const IDLE_INTERVAL_MS: f64 = 200.0;
