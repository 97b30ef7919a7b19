use std::sync::Arc;
use uuid::Uuid;

use sensor_common::types::Callback;

/// Callback registered by an experience.
pub struct Listener<T> {
    callback: Callback<T>,
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
        }
    }
}

impl<T> Listener<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Uuid, Arc<T>) + Send + Sync + 'static,
    {
        Listener {
            callback: Arc::new(callback),
        }
    }
}

impl<T> Listener<T> {
    pub fn get_callback(&self) -> Callback<T> {
        self.callback.clone()
    }
}

impl<T> std::fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("callback", &"<callback_fn>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener;
    use std::sync::Mutex;

    struct TestHandler {
        data: Mutex<Vec<i32>>,
    }

    impl TestHandler {
        fn new() -> Self {
            Self {
                data: Mutex::new(Vec::new()),
            }
        }

        fn handle(&self, _id: Uuid, value: Arc<Vec<i32>>) {
            let mut data = self.data.lock().unwrap();
            *data = (*value).clone();
        }
    }

    #[test]
    fn test_new_listener() {
        let listener = Listener::new(move |_id: Uuid, value: Arc<i32>| {
            assert_eq!(*value, 42);
        });

        let callback = listener.get_callback();
        callback(Uuid::new_v4(), Arc::new(42));
    }

    #[test]
    fn test_listener_with_method() {
        let handler = Arc::new(TestHandler::new());

        let listener = Listener::new({
            let handler = handler.clone();
            move |id: Uuid, value: Arc<Vec<i32>>| handler.handle(id, value)
        });

        let callback = listener.get_callback();
        callback(Uuid::new_v4(), Arc::new(vec![400]));
        assert_eq!(*handler.data.lock().unwrap(), vec![400]);
    }

    #[test]
    fn test_listener_with_macro() {
        let handler = Arc::new(TestHandler::new());

        let listener = listener!(handler.handle);

        let callback = listener.get_callback();
        callback(Uuid::new_v4(), Arc::new(vec![400]));
        assert_eq!(*handler.data.lock().unwrap(), vec![400]);
    }

    struct Opaque;

    #[test]
    fn test_clone_listener_of_non_clone_payload() {
        let calls = Arc::new(Mutex::new(0));
        let listener = Listener::new({
            let calls = calls.clone();
            move |_id: Uuid, _value: Arc<Opaque>| *calls.lock().unwrap() += 1
        });

        let copy = listener.clone();
        listener.get_callback()(Uuid::new_v4(), Arc::new(Opaque));
        copy.get_callback()(Uuid::new_v4(), Arc::new(Opaque));
        assert_eq!(*calls.lock().unwrap(), 2);
    }
}
