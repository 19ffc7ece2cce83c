use crate::RuntimeProvider;
use core::future::Future;

/// An implementation of [`RuntimeProvider`] backed by the
/// [`tokio`](https://docs.rs/tokio) runtime.
///
/// Spawning goes through [`tokio::spawn`], so workers must be started from
/// within a Tokio runtime context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRuntime;

impl RuntimeProvider for TokioRuntime {
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    fn spawn<F>(future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Dropping the handle detaches the task.
        drop(tokio::spawn(future));
    }

    fn yield_now() -> impl Future<Output = ()> + Send {
        tokio::task::yield_now()
    }
}
