#[cfg(any(feature = "serde-serialize", test))]
use serde::Serialize;

use crate::types::XYZ;

/// Rotation around the z (alpha), x (beta) and y (gamma) axes.
#[cfg_attr(any(feature = "serde-serialize", test), derive(Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RotationAngles {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl RotationAngles {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    pub fn is_finite(&self) -> bool {
        self.alpha.is_finite() && self.beta.is_finite() && self.gamma.is_finite()
    }
}

/// Composite motion sample produced by the device-motion sensor.
///
/// - `acceleration`: user acceleration without gravity, m/s^2.
/// - `acceleration_including_gravity`: raw acceleration, m/s^2.
/// - `rotation`: device attitude, rad.
/// - `rotation_rate`: angular velocity, rad/s.
/// - `orientation`: screen orientation in degrees (0, 90, 180, -90).
#[cfg_attr(
    any(feature = "serde-serialize", test),
    derive(Serialize),
    serde(rename_all = "camelCase")
)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceMotion {
    pub acceleration: XYZ,
    pub acceleration_including_gravity: XYZ,
    pub rotation: RotationAngles,
    pub rotation_rate: RotationAngles,
    pub orientation: i32,
}

impl DeviceMotion {
    /// Builds a motion sample deriving `acceleration_including_gravity` from
    /// the user acceleration and the gravity vector expressed in device axes.
    pub fn from_parts(
        acceleration: XYZ,
        gravity: XYZ,
        rotation: RotationAngles,
        rotation_rate: RotationAngles,
        orientation: i32,
    ) -> Self {
        Self {
            acceleration_including_gravity: acceleration.clone() + gravity,
            acceleration,
            rotation,
            rotation_rate,
            orientation,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.acceleration.is_finite()
            && self.acceleration_including_gravity.is_finite()
            && self.rotation.is_finite()
            && self.rotation_rate.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_adds_gravity() {
        let motion = DeviceMotion::from_parts(
            XYZ::new([0.5, 0.0, 0.0]),
            XYZ::new([0.0, 0.0, -9.8]),
            RotationAngles::default(),
            RotationAngles::new(0.1, 0.2, 0.3),
            90,
        );
        assert_eq!(
            motion.acceleration_including_gravity.inner(),
            [0.5, 0.0, -9.8]
        );
        assert_eq!(motion.acceleration.inner(), [0.5, 0.0, 0.0]);
        assert_eq!(motion.orientation, 90);
    }

    #[test]
    fn test_serialize_field_names() {
        let motion = DeviceMotion::default();
        let value = serde_json::to_value(&motion).unwrap();
        assert!(value.get("accelerationIncludingGravity").is_some());
        assert!(value.get("rotationRate").is_some());
        assert_eq!(value["rotation"]["alpha"], 0.0);
    }
}
