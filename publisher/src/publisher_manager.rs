use dashmap::DashMap;
use std::cmp::Eq;
use std::hash::Hash;
use std::sync::Arc;

use sensor_common::types::ExperienceId;

use crate::publisher::{Publishable, Publisher};

/// Manages one publisher per event source type `S` (e.g. a sensor kind) and
/// the listeners experiences register on them.
///
/// Cloning the manager, or a publisher obtained from it, shares the
/// underlying registry.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use publisher::{Listener, PublisherManager};
/// use sensor_common::types::{ExperienceId, SensorKind};
///
/// let manager = PublisherManager::<f64, SensorKind>::new(&SensorKind::ALL);
/// let experience = ExperienceId::from("@user/app");
///
/// // add listener to the accelerometer publisher
/// let accelerometer = manager.publisher(&SensorKind::Accelerometer).unwrap();
/// accelerometer.put(experience.clone(), Listener::new(|_id, value: Arc<f64>| {
///     println!("value: {}", value);
/// }));
/// assert_eq!(manager.len(&SensorKind::Accelerometer), 1);
///
/// // remove every listener of the experience
/// assert_eq!(manager.remove_all(&experience), vec![SensorKind::Accelerometer]);
/// ```
pub struct PublisherManager<T, S> {
    publishers: Arc<DashMap<S, Publisher<T>>>,
}

impl<T, S> Clone for PublisherManager<T, S> {
    fn clone(&self) -> Self {
        Self {
            publishers: Arc::clone(&self.publishers),
        }
    }
}

impl<T, S> PublisherManager<T, S>
where
    T: Send + Sync + 'static,
    S: Hash + Eq + Ord + Clone,
{
    pub fn new(publisher_types: &[S]) -> Self {
        let collection = DashMap::<S, Publisher<T>>::new();
        for publisher_type in publisher_types {
            collection.insert(publisher_type.clone(), Publisher::new());
        }

        Self {
            publishers: Arc::new(collection),
        }
    }

    /// Returns a handle sharing the registry of `publisher_type`.
    pub fn publisher(&self, publisher_type: &S) -> Option<Publisher<T>> {
        self.publishers
            .get(publisher_type)
            .map(|entry| entry.value().clone())
    }

    /// Removes every listener of `experience_id`. Returns the publisher
    /// types it was registered on, sorted.
    pub fn remove_all(&self, experience_id: &ExperienceId) -> Vec<S> {
        let mut removed: Vec<S> = self
            .all_publishers()
            .into_iter()
            .filter_map(|(publisher_type, publisher)| {
                publisher
                    .unregister_listener(experience_id)
                    .map(|_| publisher_type)
            })
            .collect();
        removed.sort();
        removed
    }

    /// Publisher types `experience_id` is registered on, sorted.
    pub fn subscribed_types(&self, experience_id: &ExperienceId) -> Vec<S> {
        let mut subscribed: Vec<S> = self
            .all_publishers()
            .into_iter()
            .filter(|(_, publisher)| publisher.contains(experience_id))
            .map(|(publisher_type, _)| publisher_type)
            .collect();
        subscribed.sort();
        subscribed
    }

    pub fn contains(&self, experience_id: &ExperienceId, publisher_type: &S) -> bool {
        self.publisher(publisher_type)
            .is_some_and(|publisher| publisher.contains(experience_id))
    }

    pub fn len(&self, publisher_type: &S) -> usize {
        self.publisher(publisher_type)
            .map_or(0, |publisher| publisher.len())
    }

    // copies the handles out so no map lock is held while working on them
    fn all_publishers(&self) -> Vec<(S, Publisher<T>)> {
        self.publishers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::Listener;
    use sensor_common::types::SensorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener(counter: &Arc<AtomicUsize>) -> Listener<u32> {
        let counter = counter.clone();
        Listener::new(move |_id, _value| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn experience(name: &str) -> ExperienceId {
        ExperienceId::from(name)
    }

    fn put(
        manager: &PublisherManager<u32, SensorKind>,
        name: &str,
        kind: SensorKind,
        listener: Listener<u32>,
    ) {
        manager
            .publisher(&kind)
            .unwrap()
            .put(experience(name), listener);
    }

    #[test]
    fn test_new_manager() {
        let manager = PublisherManager::<u32, SensorKind>::new(&SensorKind::ALL);
        for kind in SensorKind::ALL {
            assert!(manager.publisher(&kind).is_some());
            assert_eq!(manager.len(&kind), 0);
        }
    }

    #[test]
    fn test_unknown_publisher_type() {
        let manager = PublisherManager::<u32, SensorKind>::new(&[SensorKind::Gyroscope]);
        assert!(manager.publisher(&SensorKind::Magnetometer).is_none());
        assert!(!manager.contains(&experience("a"), &SensorKind::Magnetometer));
        assert_eq!(manager.len(&SensorKind::Magnetometer), 0);
    }

    #[test]
    fn test_put_same_pair_twice_keeps_one_listener() {
        let manager = PublisherManager::<u32, SensorKind>::new(&SensorKind::ALL);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        put(&manager, "a", SensorKind::Accelerometer, counting_listener(&first));
        put(&manager, "a", SensorKind::Accelerometer, counting_listener(&second));
        assert_eq!(manager.len(&SensorKind::Accelerometer), 1);

        manager
            .publisher(&SensorKind::Accelerometer)
            .unwrap()
            .notify_listeners(Arc::new(1));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_all_only_touches_one_experience() {
        let manager = PublisherManager::<u32, SensorKind>::new(&SensorKind::ALL);
        let counter_a = Arc::new(AtomicUsize::new(0));
        let counter_b = Arc::new(AtomicUsize::new(0));
        for kind in [SensorKind::DeviceMotion, SensorKind::Accelerometer] {
            put(&manager, "a", kind, counting_listener(&counter_a));
            put(&manager, "b", kind, counting_listener(&counter_b));
        }
        assert_eq!(
            manager.subscribed_types(&experience("a")),
            vec![SensorKind::Accelerometer, SensorKind::DeviceMotion]
        );

        let removed = manager.remove_all(&experience("a"));
        assert_eq!(
            removed,
            vec![SensorKind::Accelerometer, SensorKind::DeviceMotion]
        );
        assert!(manager.subscribed_types(&experience("a")).is_empty());
        assert!(manager.contains(&experience("b"), &SensorKind::Accelerometer));

        manager
            .publisher(&SensorKind::Accelerometer)
            .unwrap()
            .notify_listeners(Arc::new(1));
        assert_eq!(counter_a.load(Ordering::SeqCst), 0);
        assert_eq!(counter_b.load(Ordering::SeqCst), 1);
        assert!(manager.remove_all(&experience("a")).is_empty());
    }

    // payload without a Clone impl
    struct Sample(u32);

    #[test]
    fn test_handles_share_registry_with_non_clone_payload() {
        let manager = PublisherManager::<Sample, SensorKind>::new(&SensorKind::ALL);
        let copy = manager.clone();
        let total = Arc::new(AtomicUsize::new(0));

        let publisher = copy.publisher(&SensorKind::Gyroscope).unwrap();
        publisher.put(
            experience("a"),
            Listener::new({
                let total = total.clone();
                move |_id, sample: Arc<Sample>| {
                    total.fetch_add(sample.0 as usize, Ordering::SeqCst);
                }
            }),
        );

        assert!(manager.contains(&experience("a"), &SensorKind::Gyroscope));
        manager
            .publisher(&SensorKind::Gyroscope)
            .unwrap()
            .notify_listeners(Arc::new(Sample(4)));
        assert_eq!(total.load(Ordering::SeqCst), 4);

        assert_eq!(manager.remove_all(&experience("a")), vec![SensorKind::Gyroscope]);
        assert!(publisher.is_empty());
    }
}
