use super::{PanicHandler, WorkerPool};
use crate::RuntimeProvider;
use core::{any::Any, marker::PhantomData};
use std::sync::Arc;

/// Name given to pools built without an explicit [`PoolBuilder::name`].
pub const DEFAULT_POOL_NAME: &str = "corral";

/// [`PoolBuilder`] configures and builds a [`WorkerPool`] running on the
/// runtime `R`.
///
/// # Example
///
/// ```
/// # #[cfg(feature = "async-tokio")]
/// # {
/// use corral::{PoolBuilder, TokioRuntime, WorkerPool};
///
/// let pool: WorkerPool<TokioRuntime> = PoolBuilder::new(4)
///     .name("ingest")
///     .task_panic_handler(|_payload| eprintln!("task panicked"))
///     .build();
/// assert_eq!(pool.capacity(), 4);
/// assert_eq!(pool.name(), "ingest");
/// # }
/// ```
pub struct PoolBuilder<R> {
    pub(crate) capacity: usize,
    pub(crate) name: Option<String>,
    pub(crate) task_panic_handler: Option<Arc<PanicHandler>>,
    _runtime: PhantomData<fn() -> R>,
}

impl<R> PoolBuilder<R>
where
    R: RuntimeProvider,
{
    /// Starts configuring a pool that runs at most `capacity` workers at once.
    ///
    /// The capacity is fixed for the lifetime of the pool. A capacity of zero
    /// is accepted, but every submission to such a pool waits forever.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            name: None,
            task_panic_handler: None,
            _runtime: PhantomData,
        }
    }

    /// Sets the name used to identify the pool in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a custom panic handler for tasks executed by the pool.
    ///
    /// The handler receives the panic payload and runs on the worker that
    /// caught it. The worker keeps serving tasks afterwards. A handler that
    /// re-raises the payload with [`std::panic::resume_unwind`] takes the
    /// worker down instead; its budget permit is released while unwinding.
    ///
    /// Without a handler, panics are logged (with the `tracing` feature) and
    /// otherwise discarded.
    pub fn task_panic_handler<F>(mut self, panic_handler: F) -> Self
    where
        F: Fn(Box<dyn Any + Send>) + Send + Sync + 'static,
    {
        self.task_panic_handler = Some(Arc::new(panic_handler));
        self
    }

    /// Constructs the [`WorkerPool`]. No worker is started until the first
    /// submission.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`tokio::sync::Semaphore::MAX_PERMITS`].
    pub fn build(self) -> WorkerPool<R> {
        WorkerPool::from_builder(self)
    }
}
