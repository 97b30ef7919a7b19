//! Test doubles for the sensor hub: platform implementations and a
//! recorder of delivered events.

pub mod gaussian;
pub mod manual_platform;
pub mod mock_platform;
pub mod recorder;

pub use manual_platform::{ManualPlatform, PlatformCall};
pub use mock_platform::MockPlatform;
pub use recorder::EventRecorder;
