#[cfg(any(feature = "serde-serialize", test))]
use serde::Serialize;

use crate::errors::SensorError;
use crate::types::{DeviceMotion, SensorKind, XYZ};

/// Payload of a reading. Its shape is fixed by the sensor kind.
#[cfg_attr(
    any(feature = "serde-serialize", test),
    derive(Serialize),
    serde(untagged)
)]
#[derive(Clone, Debug, PartialEq)]
pub enum ReadingPayload {
    Vector(XYZ),
    Motion(DeviceMotion),
}

impl ReadingPayload {
    fn matches(&self, kind: SensorKind) -> bool {
        match self {
            ReadingPayload::Vector(_) => kind.is_vector(),
            ReadingPayload::Motion(_) => !kind.is_vector(),
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            ReadingPayload::Vector(xyz) => xyz.is_finite(),
            ReadingPayload::Motion(motion) => motion.is_finite(),
        }
    }
}

/// One timestamped sample emitted by a sensor kind.
///
/// # Examples
///
/// ```
/// use sensor_common::types::{Reading, SensorKind, XYZ};
///
/// let reading = Reading::vector(SensorKind::Gyroscope, 1.5, XYZ::new([0.0, 0.1, 0.2])).unwrap();
/// assert_eq!(reading.kind(), SensorKind::Gyroscope);
/// assert_eq!(reading.timestamp_secs(), 1.5);
///
/// // DeviceMotion readings can't carry a plain vector
/// assert!(Reading::vector(SensorKind::DeviceMotion, 1.5, XYZ::default()).is_err());
/// ```
#[cfg_attr(any(feature = "serde-serialize", test), derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    kind: SensorKind,
    timestamp: f64,
    #[cfg_attr(any(feature = "serde-serialize", test), serde(flatten))]
    payload: ReadingPayload,
}

impl Reading {
    /// Creates a reading, checking that the payload shape matches `kind`
    /// and that all values are finite.
    pub fn new(
        kind: SensorKind,
        timestamp: f64,
        payload: ReadingPayload,
    ) -> Result<Self, SensorError> {
        if !timestamp.is_finite() {
            return Err(SensorError::invalid_argument(format!(
                "timestamp {} is not finite",
                timestamp
            )));
        }
        if !payload.matches(kind) {
            return Err(SensorError::invalid_argument(format!(
                "payload shape doesnt match sensor {}",
                kind
            )));
        }
        if !payload.is_finite() {
            return Err(SensorError::invalid_argument(format!(
                "payload of sensor {} contains non finite values",
                kind
            )));
        }
        Ok(Self {
            kind,
            timestamp,
            payload,
        })
    }

    pub fn vector(kind: SensorKind, timestamp: f64, measurement: XYZ) -> Result<Self, SensorError> {
        Self::new(kind, timestamp, ReadingPayload::Vector(measurement))
    }

    pub fn motion(timestamp: f64, motion: DeviceMotion) -> Result<Self, SensorError> {
        Self::new(
            SensorKind::DeviceMotion,
            timestamp,
            ReadingPayload::Motion(motion),
        )
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp
    }

    pub fn payload(&self) -> &ReadingPayload {
        &self.payload
    }

    /// Returns the 3-axis measurement of vector kinds.
    pub fn as_vector(&self) -> Option<&XYZ> {
        match &self.payload {
            ReadingPayload::Vector(xyz) => Some(xyz),
            ReadingPayload::Motion(_) => None,
        }
    }

    pub fn as_motion(&self) -> Option<&DeviceMotion> {
        match &self.payload {
            ReadingPayload::Motion(motion) => Some(motion),
            ReadingPayload::Vector(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RotationAngles;
    use once_cell::sync::Lazy;

    static MOTION: Lazy<DeviceMotion> = Lazy::new(|| {
        DeviceMotion::from_parts(
            XYZ::new([0.0, 0.0, 0.0]),
            XYZ::new([0.0, 0.0, -9.81]),
            RotationAngles::new(0.0, 0.5, 0.0),
            RotationAngles::default(),
            0,
        )
    });

    #[test]
    fn test_vector_kinds_accept_vectors() {
        for kind in SensorKind::ALL.iter().filter(|k| k.is_vector()) {
            let reading = Reading::vector(*kind, 0.1, XYZ::new([1.0, 2.0, 3.0])).unwrap();
            assert_eq!(reading.as_vector().unwrap().inner(), [1.0, 2.0, 3.0]);
            assert!(reading.as_motion().is_none());
        }
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let err = Reading::new(
            SensorKind::Accelerometer,
            0.1,
            ReadingPayload::Motion(MOTION.clone()),
        )
        .unwrap_err();
        assert!(matches!(err, SensorError::InvalidArgument(_)));
        assert!(Reading::vector(SensorKind::DeviceMotion, 0.1, XYZ::default()).is_err());
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        assert!(Reading::vector(SensorKind::Gyroscope, f64::NAN, XYZ::default()).is_err());
        assert!(Reading::vector(
            SensorKind::Gyroscope,
            0.0,
            XYZ::new([f64::INFINITY, 0.0, 0.0])
        )
        .is_err());
    }

    #[test]
    fn test_motion_reading() {
        let reading = Reading::motion(2.0, MOTION.clone()).unwrap();
        assert_eq!(reading.kind(), SensorKind::DeviceMotion);
        assert_eq!(reading.as_motion(), Some(&*MOTION));
    }

    #[test]
    fn test_serialize_vector_reading() {
        let reading =
            Reading::vector(SensorKind::Magnetometer, 1.0, XYZ::new([1.0, 2.0, 3.0])).unwrap();
        let serialized = serde_json::to_string(&reading).unwrap();
        assert_eq!(
            serialized,
            r#"{"kind":"magnetometer","timestamp":1.0,"x":1.0,"y":2.0,"z":3.0}"#
        );
    }

    #[test]
    fn test_serialize_motion_reading() {
        let reading = Reading::motion(2.0, MOTION.clone()).unwrap();
        let value = serde_json::to_value(&reading).unwrap();
        assert_eq!(value["kind"], "device_motion");
        assert_eq!(value["rotation"]["beta"], 0.5);
        assert_eq!(value["accelerationIncludingGravity"]["z"], -9.81);
    }
}
