use dashmap::DashMap;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

use sensor_common::types::{Callback, ExperienceId};

use crate::listener::Listener;

pub trait Publishable<T> {
    fn register_listener(&self, experience_id: ExperienceId, listener: Listener<T>) -> Uuid;
    fn unregister_listener(&self, experience_id: &ExperienceId) -> Option<Uuid>;
    fn notify_listeners(&self, data: Arc<T>) -> NotifyReport;
}

/// A listener that panicked while being notified.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryFailure {
    pub experience_id: ExperienceId,
    pub subscription_id: Uuid,
    pub message: String,
}

/// Outcome of one notification round.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotifyReport {
    /// Listeners that returned normally.
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

struct Subscriber<T> {
    id: Uuid,
    callback: Callback<T>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: self.callback.clone(),
        }
    }
}

/// Record of the listeners of one event source, at most one per experience.
///
/// Clones share the same record.
pub struct Publisher<T> {
    listeners: Arc<DashMap<ExperienceId, Subscriber<T>>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Publisher<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(DashMap::new()),
        }
    }

    /// Registers `listener` for `experience_id`, replacing any previous one.
    /// Returns the id of the new subscription.
    pub fn put(&self, experience_id: ExperienceId, listener: Listener<T>) -> Uuid {
        let id = Uuid::new_v4();
        let subscriber = Subscriber {
            id,
            callback: listener.get_callback(),
        };
        if let Some(previous) = self.listeners.insert(experience_id.clone(), subscriber) {
            log::debug!(
                "Replaced subscription {} of experience {} with {}",
                previous.id,
                experience_id,
                id
            );
        }
        id
    }

    /// Removes the listener of `experience_id`, returning its subscription id.
    pub fn remove(&self, experience_id: &ExperienceId) -> Option<Uuid> {
        self.listeners
            .remove(experience_id)
            .map(|(_, subscriber)| subscriber.id)
    }

    /// Removes the listener of `experience_id` only if it is still the
    /// subscription `id`, so a stale id never removes a replacement.
    pub fn remove_if_id(&self, experience_id: &ExperienceId, id: Uuid) -> bool {
        self.listeners
            .remove_if(experience_id, |_, subscriber| subscriber.id == id)
            .is_some()
    }

    pub fn clear(&self) {
        self.listeners.clear();
    }

    pub fn contains(&self, experience_id: &ExperienceId) -> bool {
        self.listeners.contains_key(experience_id)
    }

    // Returns true if no listeners registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Experiences with a registered listener, sorted.
    pub fn experiences(&self) -> Vec<ExperienceId> {
        let mut experiences: Vec<ExperienceId> = self
            .listeners
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        experiences.sort();
        experiences
    }

    /// Point in time copy of the registered listeners. No map lock is held
    /// once this returns.
    pub fn snapshot(&self) -> Vec<(ExperienceId, Uuid, Callback<T>)> {
        self.listeners
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().id,
                    entry.value().callback.clone(),
                )
            })
            .collect()
    }
}

impl<T> Publishable<T> for Publisher<T>
where
    T: Send + Sync + 'static,
{
    fn register_listener(&self, experience_id: ExperienceId, listener: Listener<T>) -> Uuid {
        self.put(experience_id, listener)
    }

    fn unregister_listener(&self, experience_id: &ExperienceId) -> Option<Uuid> {
        self.remove(experience_id)
    }

    fn notify_listeners(&self, data: Arc<T>) -> NotifyReport {
        notify_snapshot(self.snapshot(), data)
    }
}

/// Calls each listener of `listeners` with `data`. Listeners run in parallel
/// and each one is isolated: a panic is recorded as a failure.
pub fn notify_snapshot<T>(
    listeners: Vec<(ExperienceId, Uuid, Callback<T>)>,
    data: Arc<T>,
) -> NotifyReport
where
    T: Send + Sync + 'static,
{
    if listeners.is_empty() {
        return NotifyReport::default();
    }
    let total = listeners.len();

    let failures: Vec<DeliveryFailure> = listeners
        .into_par_iter()
        .filter_map(|(experience_id, id, callback)| {
            let data = data.clone();
            panic::catch_unwind(AssertUnwindSafe(|| callback(id, data)))
                .err()
                .map(|payload| DeliveryFailure {
                    experience_id,
                    subscription_id: id,
                    message: panic_message(payload.as_ref()),
                })
        })
        .collect();

    NotifyReport {
        delivered: total - failures.len(),
        failures,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "listener panicked".to_string()
    }
}
