use crate::types::{Reading, SensorKind};

/// Event delivered to a subscriber callback.
#[derive(Clone, Debug, PartialEq)]
pub enum SensorEvent {
    /// A new sample of the subscribed sensor.
    Reading(Reading),
    /// The platform lost access to the sensor. Delivered once; the
    /// subscription is removed afterwards.
    Unavailable { kind: SensorKind, reason: String },
}

impl SensorEvent {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorEvent::Reading(reading) => reading.kind(),
            SensorEvent::Unavailable { kind, .. } => *kind,
        }
    }

    pub fn as_reading(&self) -> Option<&Reading> {
        match self {
            SensorEvent::Reading(reading) => Some(reading),
            SensorEvent::Unavailable { .. } => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, SensorEvent::Unavailable { .. })
    }
}

impl From<Reading> for SensorEvent {
    fn from(value: Reading) -> Self {
        SensorEvent::Reading(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::XYZ;

    #[test]
    fn test_kind() {
        let reading = Reading::vector(SensorKind::Gyroscope, 0.0, XYZ::default()).unwrap();
        let event = SensorEvent::from(reading.clone());
        assert_eq!(event.kind(), SensorKind::Gyroscope);
        assert_eq!(event.as_reading(), Some(&reading));

        let event = SensorEvent::Unavailable {
            kind: SensorKind::Magnetometer,
            reason: "lost".to_string(),
        };
        assert_eq!(event.kind(), SensorKind::Magnetometer);
        assert!(event.is_unavailable());
        assert!(event.as_reading().is_none());
    }
}
