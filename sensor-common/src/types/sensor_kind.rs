#[cfg(any(feature = "serde-serialize", test))]
use serde::Serialize;
use std::fmt;

use crate::constants::N_SENSOR_KINDS;

/// Represents the motion sensor kinds multiplexed by the hub.
///
/// # Variants
///
/// - `Accelerometer`: acceleration including gravity, in g.
/// - `Gyroscope`: rotation rate around each axis, in rad/s.
/// - `Magnetometer`: calibrated magnetic field, in uT.
/// - `MagnetometerUncalibrated`: raw magnetic field, in uT.
/// - `DeviceMotion`: composite attitude and acceleration fields.
///
/// # Examples
///
/// ```
/// use sensor_common::types::SensorKind;
///
/// let kind = SensorKind::try_from("gyroscope").unwrap();
/// assert_eq!(kind, SensorKind::Gyroscope);
/// assert_eq!(usize::from(kind), 1);
///
/// let kind = SensorKind::try_from("Magnetometer_Uncalibrated").unwrap();
/// assert_eq!(kind, SensorKind::MagnetometerUncalibrated);
/// ```
#[cfg_attr(
    any(feature = "serde-serialize", test),
    derive(Serialize),
    serde(rename_all = "snake_case")
)]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Hash, Eq, Ord)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    MagnetometerUncalibrated,
    DeviceMotion,
}

impl SensorKind {
    /// Every sensor kind, ordered by index.
    pub const ALL: [SensorKind; N_SENSOR_KINDS] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::Magnetometer,
        SensorKind::MagnetometerUncalibrated,
        SensorKind::DeviceMotion,
    ];

    /// Dense index of the kind, usable to address per-kind tables.
    pub fn index(&self) -> usize {
        match self {
            SensorKind::Accelerometer => 0,
            SensorKind::Gyroscope => 1,
            SensorKind::Magnetometer => 2,
            SensorKind::MagnetometerUncalibrated => 3,
            SensorKind::DeviceMotion => 4,
        }
    }

    /// Returns true if readings of this kind carry a single 3-axis vector.
    pub fn is_vector(&self) -> bool {
        !matches!(self, SensorKind::DeviceMotion)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Magnetometer => "magnetometer",
            SensorKind::MagnetometerUncalibrated => "magnetometer_uncalibrated",
            SensorKind::DeviceMotion => "device_motion",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SensorKind> for usize {
    fn from(value: SensorKind) -> Self {
        value.index()
    }
}

impl From<&SensorKind> for usize {
    fn from(value: &SensorKind) -> Self {
        value.index()
    }
}

impl TryFrom<usize> for SensorKind {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        SensorKind::ALL
            .get(value)
            .copied()
            .ok_or_else(|| format!("Sensor index {} doesnt exist", value))
    }
}

impl TryFrom<&str> for SensorKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower_case_value = value.to_lowercase();
        // checked before "mag" so uncalibrated names don't fall into Magnetometer
        if lower_case_value.contains("uncal") {
            Ok(Self::MagnetometerUncalibrated)
        } else if lower_case_value.contains("acc") {
            Ok(Self::Accelerometer)
        } else if lower_case_value.contains("gyr") {
            Ok(Self::Gyroscope)
        } else if lower_case_value.contains("mag") {
            Ok(Self::Magnetometer)
        } else if lower_case_value.contains("motion") {
            Ok(Self::DeviceMotion)
        } else {
            Err(format!("Unknown sensor kind: {}", value))
        }
    }
}

impl TryFrom<String> for SensorKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SensorKind::try_from(value.as_str())
    }
}
