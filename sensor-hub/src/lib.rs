//! # Crate sensor-hub
//!
//! ## sensor-hub
//!
//! The `sensor-hub` crate multiplexes the motion sensors of a device between several
//! experiences hosted in the same process. Each physical sensor is started once, no matter
//! how many experiences listen to it, and every reading is pushed to all of them.
//!
//! Features include:
//! - Accelerometer, Gyroscope, Magnetometer, uncalibrated Magnetometer and Device Motion streams.
//! - Per experience update intervals. Each sensor samples at the fastest interval requested by
//!   its current subscribers, and stops when the last one leaves.
//! - One [`SensorManagerBinding`] per experience, scoping every call to that experience and
//!   removing all of its subscriptions at once on teardown.
//! - Isolation of subscriber callbacks: a panicking callback is reported and does not prevent
//!   delivery to the others.
//!
//! The host supplies access to the hardware by implementing [`PlatformSensor`].
//!
//! ```
//! use std::sync::Arc;
//! use sensor_hub::{HubConfig, SensorHub, SensorKind};
//! use test_utils::ManualPlatform;
//!
//! let platform = Arc::new(ManualPlatform::new());
//! let hub = SensorHub::new(platform.clone(), HubConfig::default()).unwrap();
//!
//! let experience = hub.binding("@user/compass");
//! experience
//!     .subscribe(SensorKind::Magnetometer, |_id, event| println!("{:?}", event))
//!     .unwrap();
//! experience.set_update_interval(SensorKind::Magnetometer, 20.0).unwrap();
//!
//! platform.emit_vector(SensorKind::Magnetometer, 0.1, [22.0, -4.5, -41.0]);
//!
//! experience.teardown();
//! assert!(!platform.is_running(SensorKind::Magnetometer));
//! ```

mod binding;
mod config;
mod diagnostics;
mod dispatcher;
mod hub;
mod interval;
mod source;
mod subscription;

pub use binding::SensorManagerBinding;
pub use config::{ErrorReporter, HubConfig};
pub use dispatcher::DeliveryStats;
pub use hub::SensorHub;
pub use interval::{interval_from_millis, IntervalController};
pub use source::{SensorSource, SourceState};
pub use subscription::SubscriptionHandle;

pub use publisher::{listener, Listener};
pub use sensor_common::{
    DeviceMotion, ExperienceId, PlatformSensor, Reading, ReadingPayload, ReadingSink,
    RotationAngles, SensorError, SensorEvent, SensorKind, XYZ,
};
