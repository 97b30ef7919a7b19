//! Fan-out of readings to the subscribers of one sensor kind.

use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use publisher::{notify_snapshot, NotifyReport, Publishable, Publisher};
use sensor_common::errors::SensorError;
use sensor_common::types::{Callback, ExperienceId, Reading, SensorEvent, SensorKind};

use crate::diagnostics::Diagnostics;

const CLOSED: u64 = 0;

/// Counters kept by the dispatcher of a sensor kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Readings received from the platform.
    pub readings: u64,
    /// Callback invocations that returned normally.
    pub deliveries: u64,
    /// Readings discarded: stale generation, wrong kind or out of order.
    pub dropped: u64,
    /// Callback invocations that panicked.
    pub failures: u64,
}

/// Last timestamp delivered, tagged with the generation it belongs to.
#[derive(Default)]
struct OrderState {
    generation: u64,
    last_timestamp: Option<f64>,
}

pub(crate) struct DeliveryDispatcher {
    kind: SensorKind,
    publisher: Publisher<SensorEvent>,
    generation: AtomicU64,
    // only held while admitting a reading, never across a fan-out
    order: Mutex<OrderState>,
    readings: AtomicU64,
    deliveries: AtomicU64,
    dropped: AtomicU64,
    failures: AtomicU64,
    diagnostics: Arc<Diagnostics>,
}

impl DeliveryDispatcher {
    pub(crate) fn new(
        kind: SensorKind,
        publisher: Publisher<SensorEvent>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            kind,
            publisher,
            generation: AtomicU64::new(CLOSED),
            order: Mutex::new(OrderState::default()),
            readings: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            diagnostics,
        }
    }

    /// Accepts readings of `generation` from now on. Generations start at 1.
    pub(crate) fn open(&self, generation: u64) {
        self.generation.store(generation, Ordering::SeqCst);
    }

    /// Drops every reading until the next `open`.
    pub(crate) fn close(&self) {
        self.generation.store(CLOSED, Ordering::SeqCst);
    }

    /// Delivers `reading` to every current subscriber.
    ///
    /// Readings of another generation or kind are dropped, as are readings
    /// older than the last one admitted for this generation. Subscribers are
    /// called with no lock held, so a callback may push to the same kind.
    pub(crate) fn dispatch(&self, generation: u64, reading: Reading) {
        self.readings.fetch_add(1, Ordering::Relaxed);

        let current = self.generation.load(Ordering::SeqCst);
        if current == CLOSED || generation != current {
            trace!(
                "Dropping {} reading of generation {} (current {})",
                self.kind,
                generation,
                current
            );
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if reading.kind() != self.kind {
            warn!(
                "Dropping {} reading pushed to the {} sink",
                reading.kind(),
                self.kind
            );
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if !self.admit(generation, reading.timestamp_secs()) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let report = self
            .publisher
            .notify_listeners(Arc::new(SensorEvent::Reading(reading)));
        self.record(report);
    }

    /// Records `timestamp` as the latest reading of `generation`.
    ///
    /// Returns false for a reading older than the last one admitted, or for
    /// one of a generation older than the newest seen. A newer generation
    /// starts its order over.
    fn admit(&self, generation: u64, timestamp: f64) -> bool {
        let mut order = self.order.lock();
        if generation > order.generation {
            *order = OrderState {
                generation,
                last_timestamp: None,
            };
        } else if generation < order.generation {
            trace!(
                "Dropping late {} reading of generation {} (order at {})",
                self.kind,
                generation,
                order.generation
            );
            return false;
        }

        if let Some(last) = order.last_timestamp {
            if timestamp < last {
                debug!(
                    "Dropping out of order {} reading: {} < {}",
                    self.kind, timestamp, last
                );
                return false;
            }
        }
        order.last_timestamp = Some(timestamp);
        true
    }

    /// Tells `listeners` the sensor is gone. Called once, after they were
    /// removed from the registry.
    pub(crate) fn deliver_unavailable(
        &self,
        listeners: Vec<(ExperienceId, Uuid, Callback<SensorEvent>)>,
        reason: String,
    ) {
        let event = Arc::new(SensorEvent::Unavailable {
            kind: self.kind,
            reason,
        });
        let report = notify_snapshot(listeners, event);
        self.record(report);
    }

    pub(crate) fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            readings: self.readings.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    fn record(&self, report: NotifyReport) {
        self.deliveries
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.failures
            .fetch_add(report.failures.len() as u64, Ordering::Relaxed);

        for failure in report.failures {
            self.diagnostics.report(&SensorError::CallbackFailure {
                experience_id: failure.experience_id,
                kind: self.kind,
                message: failure.message,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use publisher::Listener;
    use sensor_common::types::XYZ;
    use test_utils::EventRecorder;

    const KIND: SensorKind = SensorKind::Accelerometer;

    fn reading(timestamp: f64) -> Reading {
        Reading::vector(KIND, timestamp, XYZ::new([0.0, 0.0, 9.8])).unwrap()
    }

    fn dispatcher() -> (DeliveryDispatcher, Publisher<SensorEvent>) {
        let publisher = Publisher::new();
        let dispatcher =
            DeliveryDispatcher::new(KIND, publisher.clone(), Arc::new(Diagnostics::new(None)));
        (dispatcher, publisher)
    }

    #[test]
    fn test_closed_dispatcher_drops_everything() {
        let (dispatcher, publisher) = dispatcher();
        let recorder = EventRecorder::new();
        publisher.put(ExperienceId::from("a"), recorder.listener());

        dispatcher.dispatch(1, reading(1.0));

        assert!(recorder.is_empty());
        assert_eq!(dispatcher.stats().dropped, 1);
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let (dispatcher, publisher) = dispatcher();
        let recorder = EventRecorder::new();
        publisher.put(ExperienceId::from("a"), recorder.listener());

        dispatcher.open(2);
        dispatcher.dispatch(1, reading(1.0));
        dispatcher.dispatch(2, reading(2.0));

        assert_eq!(recorder.timestamps(), vec![2.0]);
        assert_eq!(
            dispatcher.stats(),
            DeliveryStats {
                readings: 2,
                deliveries: 1,
                dropped: 1,
                failures: 0
            }
        );
    }

    #[test]
    fn test_out_of_order_readings_are_dropped() {
        let (dispatcher, publisher) = dispatcher();
        let recorder = EventRecorder::new();
        publisher.put(ExperienceId::from("a"), recorder.listener());
        dispatcher.open(1);

        for timestamp in [1.0, 3.0, 2.0, 3.0, 4.0] {
            dispatcher.dispatch(1, reading(timestamp));
        }

        assert_eq!(recorder.timestamps(), vec![1.0, 3.0, 3.0, 4.0]);
        assert_eq!(dispatcher.stats().dropped, 1);
    }

    #[test]
    fn test_order_restarts_with_generation() {
        let (dispatcher, publisher) = dispatcher();
        let recorder = EventRecorder::new();
        publisher.put(ExperienceId::from("a"), recorder.listener());

        dispatcher.open(1);
        dispatcher.dispatch(1, reading(10.0));
        dispatcher.close();
        dispatcher.open(2);
        dispatcher.dispatch(2, reading(1.0));

        assert_eq!(recorder.timestamps(), vec![10.0, 1.0]);
    }

    #[test]
    fn test_late_generation_does_not_reset_order() {
        let (dispatcher, _publisher) = dispatcher();

        assert!(dispatcher.admit(2, 5.0));
        // a reading of generation 1 that passed the open check before the restart
        assert!(!dispatcher.admit(1, 1.0));
        assert!(!dispatcher.admit(2, 4.0));
        assert!(dispatcher.admit(2, 5.0));
        assert!(dispatcher.admit(3, 0.5));
    }

    #[test]
    fn test_callback_can_dispatch_reentrantly() {
        let publisher = Publisher::new();
        let dispatcher = Arc::new(DeliveryDispatcher::new(
            KIND,
            publisher.clone(),
            Arc::new(Diagnostics::new(None)),
        ));
        let recorder = EventRecorder::new();
        publisher.put(ExperienceId::from("a"), recorder.listener());
        publisher.put(
            ExperienceId::from("b"),
            Listener::new({
                let dispatcher = Arc::downgrade(&dispatcher);
                move |_id, event: Arc<SensorEvent>| {
                    if event.as_reading().is_some_and(|r| r.timestamp_secs() == 1.0) {
                        if let Some(dispatcher) = dispatcher.upgrade() {
                            dispatcher.dispatch(1, reading(2.0));
                        }
                    }
                }
            }),
        );
        dispatcher.open(1);

        dispatcher.dispatch(1, reading(1.0));

        let mut timestamps = recorder.timestamps();
        timestamps.sort_by(f64::total_cmp);
        assert_eq!(timestamps, vec![1.0, 2.0]);
        assert_eq!(dispatcher.stats().deliveries, 4);
    }

    #[test]
    fn test_wrong_kind_is_dropped() {
        let (dispatcher, publisher) = dispatcher();
        let recorder = EventRecorder::new();
        publisher.put(ExperienceId::from("a"), recorder.listener());
        dispatcher.open(1);

        let gyro = Reading::vector(SensorKind::Gyroscope, 1.0, XYZ::default()).unwrap();
        dispatcher.dispatch(1, gyro);

        assert!(recorder.is_empty());
        assert_eq!(dispatcher.stats().dropped, 1);
    }

    #[test]
    fn test_failures_are_counted_and_reported() {
        let publisher = Publisher::new();
        let diagnostics = Arc::new(Diagnostics::new(None));
        let dispatcher = DeliveryDispatcher::new(KIND, publisher.clone(), diagnostics.clone());
        let recorder = EventRecorder::new();
        publisher.put(ExperienceId::from("good"), recorder.listener());
        publisher.put(
            ExperienceId::from("bad"),
            Listener::new(|_, _| panic!("bad callback")),
        );
        dispatcher.open(1);

        dispatcher.dispatch(1, reading(1.0));

        assert_eq!(recorder.len(), 1);
        assert_eq!(dispatcher.stats().deliveries, 1);
        assert_eq!(dispatcher.stats().failures, 1);
        assert_eq!(diagnostics.reported(), 1);
    }

    #[test]
    fn test_deliver_unavailable() {
        let (dispatcher, publisher) = dispatcher();
        let recorder = EventRecorder::new();
        publisher.put(ExperienceId::from("a"), recorder.listener());
        let listeners = publisher.snapshot();
        publisher.clear();

        dispatcher.deliver_unavailable(listeners, "lost".to_string());

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            *events[0].1,
            SensorEvent::Unavailable {
                kind: KIND,
                reason: "lost".to_string()
            }
        );
    }
}
