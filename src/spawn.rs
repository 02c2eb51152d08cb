use std::future::Future;

/// Runs `task` on the current thread without waiting for it.
///
/// There is no handle and no cancellation. Natively this must be called from
/// inside a `tokio::task::LocalSet`.
pub fn spawn_detached<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(task);

    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::task::spawn_local(task);
    }
}
