pub mod platform;

pub use crate::traits::platform::{PlatformSensor, ReadingReceiver, ReadingSink};
