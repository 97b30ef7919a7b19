/// Builds a [`Listener`](crate::Listener) that forwards to a method of a
/// shared handler: `listener!(handler.method)` where `handler` is an `Arc`
/// and `method` takes `(Uuid, Arc<T>)`.
#[macro_export]
macro_rules! listener {
    ($handler:ident.$method:ident) => {
        $crate::Listener::new({
            let handler = $handler.clone();
            move |id, value| {
                handler.$method(id, value);
            }
        })
    };
}
