use std::sync::Arc;
use uuid::Uuid;

/// Callback invoked with the id of the subscription and the delivered data.
pub type Callback<T> = Arc<dyn Fn(Uuid, Arc<T>) + Send + Sync>;
