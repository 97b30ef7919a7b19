//! Shared core multiplexing every sensor kind to the hosted experiences.

use log::{debug, info};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use uuid::Uuid;

use publisher::{Listener, Publisher, PublisherManager};
use sensor_common::errors::SensorError;
use sensor_common::traits::{PlatformSensor, ReadingReceiver, ReadingSink};
use sensor_common::types::{ExperienceId, Reading, SensorEvent, SensorKind};

use crate::binding::SensorManagerBinding;
use crate::config::HubConfig;
use crate::diagnostics::Diagnostics;
use crate::dispatcher::{DeliveryDispatcher, DeliveryStats};
use crate::interval::{interval_from_millis, IntervalController};
use crate::source::{SensorSource, SourceState};
use crate::subscription::SubscriptionHandle;

/// State of one kind that only changes under the kind's lock.
struct KindControl {
    source: SensorSource,
    intervals: IntervalController,
    generation: u64,
}

/// Everything the hub keeps for one sensor kind. Receives what the
/// platform pushes for that kind.
struct KindChannel {
    kind: SensorKind,
    control: Mutex<KindControl>,
    publisher: Publisher<SensorEvent>,
    dispatcher: DeliveryDispatcher,
    diagnostics: Arc<Diagnostics>,
}

impl KindChannel {
    fn subscribe(
        self: &Arc<Self>,
        experience_id: ExperienceId,
        listener: Listener<SensorEvent>,
    ) -> Result<Uuid, SensorError> {
        let mut control = self.control.lock();
        if let SourceState::Unavailable(reason) = control.source.state() {
            return Err(SensorError::unavailable(self.kind, reason.clone()));
        }

        let id = self.publisher.put(experience_id, listener);
        if let Err(err) = self.activate(&mut control) {
            // the source was idle, so this was the only subscription
            self.publisher.clear();
            control.intervals.recompute(&[]);
            drop(control);
            self.diagnostics.report(&err);
            return Err(err);
        }
        Ok(id)
    }

    /// Applies the effective interval and starts the source if it is idle.
    fn activate(self: &Arc<Self>, control: &mut KindControl) -> Result<(), SensorError> {
        let subscribers = self.publisher.experiences();
        if let Some(interval) = control.intervals.recompute(&subscribers) {
            control.source.set_interval(interval);
        }
        if control.source.is_active() {
            return Ok(());
        }

        control.generation += 1;
        let generation = control.generation;
        let receiver: Weak<KindChannel> = Arc::downgrade(self);
        let receiver: Weak<dyn ReadingReceiver> = receiver;
        let sink = ReadingSink::new(self.kind, generation, receiver);

        self.dispatcher.open(generation);
        if let Err(err) = control.source.start(control.intervals.applied(), sink) {
            self.dispatcher.close();
            return Err(err);
        }
        Ok(())
    }

    /// Brings interval and source in line with the current subscribers after
    /// a removal or an interval request.
    fn reconfigure(&self, control: &mut KindControl) {
        let subscribers = self.publisher.experiences();
        if subscribers.is_empty() && control.source.is_active() {
            self.dispatcher.close();
            control.source.stop();
        }
        if let Some(interval) = control.intervals.recompute(&subscribers) {
            control.source.set_interval(interval);
        }
    }

    fn unsubscribe(&self, experience_id: &ExperienceId) -> bool {
        let mut control = self.control.lock();
        let removed = self.publisher.remove(experience_id).is_some();
        if removed {
            self.reconfigure(&mut control);
        }
        removed
    }

    fn unsubscribe_id(&self, experience_id: &ExperienceId, id: Uuid) -> bool {
        let mut control = self.control.lock();
        let removed = self.publisher.remove_if_id(experience_id, id);
        if removed {
            self.reconfigure(&mut control);
        }
        removed
    }

    fn set_update_interval(&self, experience_id: ExperienceId, interval: Duration) {
        let mut control = self.control.lock();
        control.intervals.request(experience_id, interval);
        self.reconfigure(&mut control);
    }

    fn reset_unavailable(&self) -> bool {
        self.control.lock().source.reset()
    }

    fn shutdown(&self) {
        let mut control = self.control.lock();
        self.dispatcher.close();
        control.source.stop();
    }
}

impl ReadingReceiver for KindChannel {
    fn on_reading(&self, generation: u64, reading: Reading) {
        self.dispatcher.dispatch(generation, reading);
    }

    fn on_failure(&self, generation: u64, reason: String) {
        let listeners = {
            let mut control = self.control.lock();
            if generation != control.generation || !control.source.is_active() {
                debug!(
                    "Ignoring failure of stopped {} sensor (generation {}): {}",
                    self.kind, generation, reason
                );
                return;
            }
            self.dispatcher.close();
            control.source.mark_unavailable(&reason);
            let listeners = self.publisher.snapshot();
            self.publisher.clear();
            control.intervals.recompute(&[]);
            listeners
        };

        self.diagnostics
            .report(&SensorError::unavailable(self.kind, reason.clone()));
        self.dispatcher.deliver_unavailable(listeners, reason);
    }
}

/// Multiplexes the physical sensors of the device to every hosted experience.
///
/// Created once by the host, which hands one [`SensorManagerBinding`] to each
/// experience. Mutations are serialized per sensor kind; readings are
/// delivered without holding any of those locks, so callbacks may subscribe,
/// unsubscribe or tear down from inside a delivery.
pub struct SensorHub {
    config: HubConfig,
    platform: Arc<dyn PlatformSensor>,
    registry: PublisherManager<SensorEvent, SensorKind>,
    // indexed by `SensorKind::index`
    channels: Vec<Arc<KindChannel>>,
    diagnostics: Arc<Diagnostics>,
}

impl SensorHub {
    /// Creates a hub on top of the host provided `platform`.
    /// Returns an InvalidArgument error if `config` is not valid.
    pub fn new(
        platform: Arc<dyn PlatformSensor>,
        config: HubConfig,
    ) -> Result<Arc<Self>, SensorError> {
        config.validate()?;

        let diagnostics = Arc::new(Diagnostics::new(config.error_reporter()));
        let registry = PublisherManager::new(&SensorKind::ALL);

        let mut channels = Vec::with_capacity(SensorKind::ALL.len());
        for kind in SensorKind::ALL {
            let publisher = registry.publisher(&kind).ok_or_else(|| {
                SensorError::invalid_argument(format!("no registry for {}", kind))
            })?;
            channels.push(Arc::new(KindChannel {
                kind,
                control: Mutex::new(KindControl {
                    source: SensorSource::new(kind, platform.clone(), config.idle_interval()),
                    intervals: IntervalController::new(
                        config.default_interval(),
                        config.idle_interval(),
                    ),
                    generation: 0,
                }),
                dispatcher: DeliveryDispatcher::new(kind, publisher.clone(), diagnostics.clone()),
                publisher,
                diagnostics: diagnostics.clone(),
            }));
        }

        info!("Sensor hub created with {:?}", config);
        Ok(Arc::new(Self {
            config,
            platform,
            registry,
            channels,
            diagnostics,
        }))
    }

    /// Creates the binding through which `experience_id` reaches the sensors.
    pub fn binding(self: &Arc<Self>, experience_id: impl Into<ExperienceId>) -> SensorManagerBinding {
        SensorManagerBinding::new(experience_id.into(), Arc::downgrade(self))
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Registers `listener` for readings of `kind`, replacing any previous
    /// subscription of `experience_id` to it, and starts the sensor if needed.
    ///
    /// Returns SensorUnavailable if the platform refuses the sensor now or
    /// did so before.
    pub fn subscribe(
        &self,
        experience_id: &ExperienceId,
        kind: SensorKind,
        listener: Listener<SensorEvent>,
    ) -> Result<SubscriptionHandle, SensorError> {
        let id = self.channel(kind).subscribe(experience_id.clone(), listener)?;
        debug!("Experience '{}' subscribed to {}", experience_id, kind);
        Ok(SubscriptionHandle::new(id, experience_id.clone(), kind))
    }

    /// Removes the subscription of `experience_id` to `kind`, stopping the
    /// sensor if it was the last one. Returns false if there was none.
    pub fn unsubscribe(&self, experience_id: &ExperienceId, kind: SensorKind) -> bool {
        let removed = self.channel(kind).unsubscribe(experience_id);
        if removed {
            debug!("Experience '{}' unsubscribed from {}", experience_id, kind);
        }
        removed
    }

    /// Removes the subscription `handle` refers to, unless it was replaced since.
    pub fn unsubscribe_handle(&self, handle: &SubscriptionHandle) -> bool {
        self.channel(handle.kind())
            .unsubscribe_id(handle.experience_id(), handle.id())
    }

    /// Records the sampling interval `experience_id` wants for `kind`.
    /// Returns InvalidArgument, keeping the previous request, unless
    /// `interval_ms` is a positive number of milliseconds.
    pub fn set_update_interval(
        &self,
        experience_id: &ExperienceId,
        kind: SensorKind,
        interval_ms: f64,
    ) -> Result<(), SensorError> {
        let interval = interval_from_millis(interval_ms)?;
        self.channel(kind)
            .set_update_interval(experience_id.clone(), interval);
        Ok(())
    }

    /// Drops every subscription and interval request of `experience_id`.
    /// Returns the kinds it was subscribed to.
    pub fn teardown(&self, experience_id: &ExperienceId) -> Vec<SensorKind> {
        // every kind locked in index order, so teardown is atomic per experience
        let mut controls: Vec<_> = self
            .channels
            .iter()
            .map(|channel| channel.control.lock())
            .collect();

        let removed = self.registry.remove_all(experience_id);
        for (channel, control) in self.channels.iter().zip(controls.iter_mut()) {
            control.intervals.forget(experience_id);
            if removed.contains(&channel.kind) {
                channel.reconfigure(control);
            }
        }
        drop(controls);

        info!(
            "Experience '{}' torn down, removed from {:?}",
            experience_id, removed
        );
        removed
    }

    /// Gravity magnitude reported by the platform, in m/s^2.
    pub fn gravity(&self) -> f64 {
        self.platform.gravity()
    }

    pub fn is_subscribed(&self, experience_id: &ExperienceId, kind: SensorKind) -> bool {
        self.registry.contains(experience_id, &kind)
    }

    /// Kinds `experience_id` is currently subscribed to.
    pub fn subscriptions_of(&self, experience_id: &ExperienceId) -> Vec<SensorKind> {
        self.registry.subscribed_types(experience_id)
    }

    pub fn subscriber_count(&self, kind: SensorKind) -> usize {
        self.registry.len(&kind)
    }

    /// Interval the sensor of `kind` is configured to sample at.
    pub fn effective_interval(&self, kind: SensorKind) -> Duration {
        self.channel(kind).control.lock().intervals.applied()
    }

    pub fn requested_interval(
        &self,
        experience_id: &ExperienceId,
        kind: SensorKind,
    ) -> Option<Duration> {
        self.channel(kind)
            .control
            .lock()
            .intervals
            .requested(experience_id)
    }

    pub fn source_state(&self, kind: SensorKind) -> SourceState {
        self.channel(kind).control.lock().source.state().clone()
    }

    pub fn delivery_stats(&self, kind: SensorKind) -> DeliveryStats {
        self.channel(kind).dispatcher.stats()
    }

    /// Errors reported through the diagnostics channel so far.
    pub fn reported_errors(&self) -> u64 {
        self.diagnostics.reported()
    }

    /// Lets `kind` be started again after the platform refused or lost it.
    /// Returns false if it was not unavailable.
    pub fn reset_unavailable(&self, kind: SensorKind) -> bool {
        self.channel(kind).reset_unavailable()
    }

    fn channel(&self, kind: SensorKind) -> &Arc<KindChannel> {
        &self.channels[kind.index()]
    }
}

impl Drop for SensorHub {
    fn drop(&mut self) {
        for channel in &self.channels {
            channel.shutdown();
        }
        debug!("Sensor hub dropped");
    }
}

impl std::fmt::Debug for SensorHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorHub")
            .field("config", &self.config)
            .field(
                "subscriptions",
                &SensorKind::ALL
                    .iter()
                    .map(|kind| self.registry.len(kind))
                    .sum::<usize>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_common::types::XYZ;
    use test_utils::{EventRecorder, ManualPlatform};

    fn setup() -> (Arc<ManualPlatform>, Arc<SensorHub>) {
        let platform = Arc::new(ManualPlatform::new());
        let hub = SensorHub::new(platform.clone(), HubConfig::default()).unwrap();
        (platform, hub)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let platform = Arc::new(ManualPlatform::new());
        let config = HubConfig::default().with_default_interval(Duration::ZERO);
        assert!(matches!(
            SensorHub::new(platform, config),
            Err(SensorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_subscribe_starts_source_at_default_interval() {
        let (platform, hub) = setup();
        let exp = ExperienceId::from("a");
        let recorder = EventRecorder::new();

        let handle = hub
            .subscribe(&exp, SensorKind::Magnetometer, recorder.listener())
            .unwrap();

        assert_eq!(handle.kind(), SensorKind::Magnetometer);
        assert_eq!(handle.experience_id(), &exp);
        assert_eq!(hub.source_state(SensorKind::Magnetometer), SourceState::Active);
        assert_eq!(
            hub.effective_interval(SensorKind::Magnetometer),
            Duration::from_millis(100)
        );
        assert_eq!(platform.start_count(SensorKind::Magnetometer), 1);
        assert_eq!(hub.subscriptions_of(&exp), vec![SensorKind::Magnetometer]);
    }

    #[test]
    fn test_generation_changes_on_restart() {
        let (platform, hub) = setup();
        let exp = ExperienceId::from("a");
        let recorder = EventRecorder::new();

        hub.subscribe(&exp, SensorKind::Gyroscope, recorder.listener())
            .unwrap();
        let first = platform.sink(SensorKind::Gyroscope).unwrap();
        hub.unsubscribe(&exp, SensorKind::Gyroscope);
        hub.subscribe(&exp, SensorKind::Gyroscope, recorder.listener())
            .unwrap();
        let second = platform.sink(SensorKind::Gyroscope).unwrap();

        assert!(second.generation() > first.generation());
        assert!(first.is_connected());
    }

    #[test]
    fn test_sink_routes_readings_to_its_channel() {
        let (platform, hub) = setup();
        let recorder = EventRecorder::new();
        hub.subscribe(
            &ExperienceId::from("a"),
            SensorKind::Magnetometer,
            recorder.listener(),
        )
        .unwrap();
        let sink = platform.sink(SensorKind::Magnetometer).unwrap();

        let reading = Reading::vector(SensorKind::Magnetometer, 1.5, XYZ::new([1.0, 2.0, 3.0]))
            .unwrap();
        assert!(sink.deliver(reading.clone()));
        assert_eq!(recorder.timestamps(), vec![1.5]);

        drop(hub);
        assert!(!sink.deliver(reading));
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_drop_stops_active_sources() {
        let (platform, hub) = setup();
        let recorder = EventRecorder::new();
        hub.subscribe(
            &ExperienceId::from("a"),
            SensorKind::Accelerometer,
            recorder.listener(),
        )
        .unwrap();
        let sink = platform.sink(SensorKind::Accelerometer).unwrap();

        drop(hub);

        assert!(!platform.is_running(SensorKind::Accelerometer));
        assert!(!sink.is_connected());
    }
}
