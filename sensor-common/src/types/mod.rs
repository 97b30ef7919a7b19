pub mod callback;
pub mod clock;
pub mod event;
pub mod experience;
pub mod motion;
pub mod reading;
pub mod sensor_kind;
pub mod xyz;

pub use callback::Callback;
pub use clock::Clock;
pub use event::SensorEvent;
pub use experience::ExperienceId;
pub use motion::{DeviceMotion, RotationAngles};
pub use reading::{Reading, ReadingPayload};
pub use sensor_kind::SensorKind;
pub use xyz::XYZ;
