//! Per-experience facade over the shared hub.

use log::debug;
use std::sync::{Arc, Weak};
use uuid::Uuid;

use publisher::Listener;
use sensor_common::errors::SensorError;
use sensor_common::types::{ExperienceId, SensorEvent, SensorKind};

use crate::hub::SensorHub;
use crate::subscription::SubscriptionHandle;

/// Sensor access of one experience.
///
/// Every call is made on behalf of the experience the binding was created
/// for, so an experience can only see and change its own subscriptions.
/// The binding does not keep the hub alive: once the host drops it,
/// subscribing fails with `HubDropped` and removals have nothing to do.
pub struct SensorManagerBinding {
    experience_id: ExperienceId,
    hub: Weak<SensorHub>,
}

impl SensorManagerBinding {
    pub(crate) fn new(experience_id: ExperienceId, hub: Weak<SensorHub>) -> Self {
        Self { experience_id, hub }
    }

    pub fn experience_id(&self) -> &ExperienceId {
        &self.experience_id
    }

    /// Calls `callback` with every event of `kind`, replacing the previous
    /// callback of this experience for it.
    pub fn subscribe<F>(&self, kind: SensorKind, callback: F) -> Result<SubscriptionHandle, SensorError>
    where
        F: Fn(Uuid, Arc<SensorEvent>) + Send + Sync + 'static,
    {
        self.subscribe_listener(kind, Listener::new(callback))
    }

    /// Same as [`SensorManagerBinding::subscribe`] with a prebuilt listener,
    /// e.g. one made with `listener!`.
    pub fn subscribe_listener(
        &self,
        kind: SensorKind,
        listener: Listener<SensorEvent>,
    ) -> Result<SubscriptionHandle, SensorError> {
        self.hub()?.subscribe(&self.experience_id, kind, listener)
    }

    /// Stops delivering `kind` to this experience. Returns false if it was
    /// not subscribed.
    pub fn unsubscribe(&self, kind: SensorKind) -> bool {
        match self.hub.upgrade() {
            Some(hub) => hub.unsubscribe(&self.experience_id, kind),
            None => false,
        }
    }

    pub fn unsubscribe_handle(&self, handle: &SubscriptionHandle) -> bool {
        if handle.experience_id() != &self.experience_id {
            return false;
        }
        match self.hub.upgrade() {
            Some(hub) => hub.unsubscribe_handle(handle),
            None => false,
        }
    }

    /// Requests readings of `kind` at least every `interval_ms` milliseconds.
    pub fn set_update_interval(&self, kind: SensorKind, interval_ms: f64) -> Result<(), SensorError> {
        self.hub()?
            .set_update_interval(&self.experience_id, kind, interval_ms)
    }

    /// Removes every subscription and interval request of this experience.
    pub fn teardown(&self) -> Vec<SensorKind> {
        match self.hub.upgrade() {
            Some(hub) => hub.teardown(&self.experience_id),
            None => {
                debug!(
                    "Teardown of '{}' after the hub was dropped",
                    self.experience_id
                );
                Vec::new()
            }
        }
    }

    /// Gravity magnitude reported by the device, in m/s^2.
    pub fn gravity(&self) -> Result<f64, SensorError> {
        Ok(self.hub()?.gravity())
    }

    pub fn is_subscribed(&self, kind: SensorKind) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|hub| hub.is_subscribed(&self.experience_id, kind))
    }

    fn hub(&self) -> Result<Arc<SensorHub>, SensorError> {
        self.hub.upgrade().ok_or(SensorError::HubDropped)
    }
}

impl std::fmt::Debug for SensorManagerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorManagerBinding")
            .field("experience_id", &self.experience_id)
            .field("connected", &(self.hub.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use test_utils::{EventRecorder, ManualPlatform};

    #[test]
    fn test_binding_scopes_calls_to_its_experience() {
        let platform = Arc::new(ManualPlatform::new());
        let hub = SensorHub::new(platform, HubConfig::default()).unwrap();
        let a = hub.binding("a");
        let b = hub.binding("b");
        let recorder = EventRecorder::new();

        let handle = a
            .subscribe(SensorKind::Accelerometer, recorder.callback())
            .unwrap();

        assert!(a.is_subscribed(SensorKind::Accelerometer));
        assert!(!b.is_subscribed(SensorKind::Accelerometer));
        assert!(!b.unsubscribe(SensorKind::Accelerometer));
        assert!(!b.unsubscribe_handle(&handle));
        assert!(a.unsubscribe_handle(&handle));
        assert!(!a.is_subscribed(SensorKind::Accelerometer));
    }

    #[test]
    fn test_binding_after_hub_dropped() {
        let platform = Arc::new(ManualPlatform::new().with_gravity(9.5));
        let hub = SensorHub::new(platform, HubConfig::default()).unwrap();
        let binding = hub.binding(ExperienceId::from("a"));
        assert_eq!(binding.gravity(), Ok(9.5));

        drop(hub);

        let recorder = EventRecorder::new();
        assert_eq!(
            binding
                .subscribe(SensorKind::Gyroscope, recorder.callback())
                .unwrap_err(),
            SensorError::HubDropped
        );
        assert_eq!(
            binding.set_update_interval(SensorKind::Gyroscope, 10.0),
            Err(SensorError::HubDropped)
        );
        assert_eq!(binding.gravity(), Err(SensorError::HubDropped));
        assert!(!binding.unsubscribe(SensorKind::Gyroscope));
        assert!(binding.teardown().is_empty());
        assert!(!binding.is_subscribed(SensorKind::Gyroscope));
    }
}
