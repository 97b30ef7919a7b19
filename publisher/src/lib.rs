//! # Crate publisher
//!
//! ## publisher
//!
//! The `publisher` crate keeps track of which experience listens to which
//! sensor kind, and fans out events of type `T` to them.
//!
//! Each experience holds at most one listener per publisher: registering
//! again replaces the previous callback. Notification works on a snapshot of
//! the registered listeners, so listeners can be added or removed while a
//! notification is in flight, and a listener that panics doesn't prevent
//! delivery to the others.
//!
//! ### Example
//!
//! ```
//! use std::sync::Arc;
//! use publisher::{Listener, Publishable, Publisher};
//! use sensor_common::types::ExperienceId;
//!
//! let publisher = Publisher::<String>::new();
//! let experience = ExperienceId::from("@user/app");
//!
//! // Register a listener
//! publisher.put(experience.clone(), Listener::new(|_id, data: Arc<String>| {
//!     println!("Listener received: {}", data);
//! }));
//!
//! // Notify all listeners
//! let report = publisher.notify_listeners(Arc::new("Hello, World!".to_string()));
//! assert_eq!(report.delivered, 1);
//!
//! // Unregister the listener
//! assert!(publisher.remove(&experience).is_some());
//! assert!(publisher.is_empty());
//! ```

pub mod listener;
pub mod macros;
pub mod publisher;
pub mod publisher_manager;

pub use listener::Listener;
pub use publisher::{notify_snapshot, DeliveryFailure, NotifyReport, Publishable, Publisher};
pub use publisher_manager::PublisherManager;
