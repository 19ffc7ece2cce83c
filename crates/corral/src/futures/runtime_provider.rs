use core::future::Future;

/// A trait that abstracts over the async runtime hosting workers and
/// spin-waits.
///
/// This allows the worker pool and the async backoff helpers to be generic
/// over runtimes like `Tokio` or `Smol`. Implementors are zero-sized markers;
/// every method is an associated function.
pub trait RuntimeProvider {
    /// Spawns `future` as a detached task on the runtime.
    ///
    /// The task must keep running after its handle is dropped.
    fn spawn<F>(future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Yields once to the runtime's scheduler.
    ///
    /// We require `Send` so that callers can hold the future across threads.
    fn yield_now() -> impl Future<Output = ()> + Send;
}
