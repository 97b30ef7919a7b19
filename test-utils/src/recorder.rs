use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

use publisher::Listener;
use sensor_common::types::{Reading, SensorEvent};

/// Collects the events delivered to a subscription.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<(Uuid, Arc<SensorEvent>)>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener appending every delivered event to this recorder.
    pub fn listener(&self) -> Listener<SensorEvent> {
        let events = self.events.clone();
        Listener::new(move |id, event| {
            events.lock().unwrap().push((id, event));
        })
    }

    /// Closure form of [`EventRecorder::listener`].
    pub fn callback(&self) -> impl Fn(Uuid, Arc<SensorEvent>) + Send + Sync + 'static {
        let events = self.events.clone();
        move |id, event| {
            events.lock().unwrap().push((id, event));
        }
    }

    pub fn events(&self) -> Vec<(Uuid, Arc<SensorEvent>)> {
        self.events.lock().unwrap().clone()
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.events()
            .iter()
            .filter_map(|(_, event)| event.as_reading().cloned())
            .collect()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.readings()
            .iter()
            .map(|reading| reading.timestamp_secs())
            .collect()
    }

    pub fn unavailable_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|(_, event)| event.is_unavailable())
            .count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Waits until at least `count` events were recorded or `timeout` expires.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.len() >= count
    }
}

impl std::fmt::Debug for EventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecorder")
            .field("events", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_common::types::{SensorKind, XYZ};

    #[test]
    fn test_records_readings_and_failures() {
        let recorder = EventRecorder::new();
        let callback = recorder.listener().get_callback();
        let reading = Reading::vector(SensorKind::Gyroscope, 1.0, XYZ::default()).unwrap();

        callback(Uuid::new_v4(), Arc::new(SensorEvent::from(reading.clone())));
        callback(
            Uuid::new_v4(),
            Arc::new(SensorEvent::Unavailable {
                kind: SensorKind::Gyroscope,
                reason: "lost".to_string(),
            }),
        );

        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.readings(), vec![reading]);
        assert_eq!(recorder.timestamps(), vec![1.0]);
        assert_eq!(recorder.unavailable_count(), 1);

        recorder.clear();
        assert!(recorder.is_empty());
    }
}
