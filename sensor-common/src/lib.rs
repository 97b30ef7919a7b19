//! General functionality shared by the sensor multiplexer crates.
//!
//! Holds the data model exchanged between the host platform, the
//! subscription registry and experience code: sensor kinds, experience
//! identifiers, readings and the events delivered to subscribers. It also
//! defines the capability trait the host implements to give access to the
//! physical sensors.

pub mod constants;
pub mod errors;

#[doc(hidden)]
pub mod traits;
#[doc(hidden)]
pub mod types;

// Re-export traits
#[doc(inline)]
pub use traits::{PlatformSensor, ReadingReceiver, ReadingSink};

// Re-export types
#[doc(inline)]
pub use errors::SensorError;
#[doc(inline)]
pub use types::{
    Callback, Clock, DeviceMotion, ExperienceId, Reading, ReadingPayload, RotationAngles,
    SensorEvent, SensorKind, XYZ,
};
