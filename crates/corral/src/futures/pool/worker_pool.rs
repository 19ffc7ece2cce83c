use super::{
    DEFAULT_POOL_NAME, PoolBuilder, Task,
    worker::{Slot, Worker, WorkerContext},
};
use crate::{Error, RuntimeProvider, TrySubmitError};
use core::{fmt, future::Future, marker::PhantomData};
use flume::{Receiver, Sender, TrySendError};
use portable_atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// A bounded pool of lazily spawned, reusable workers.
///
/// At most [`capacity`] workers are alive at any time. Workers are spawned on
/// the runtime `R` only when a submission finds no idle worker, and they stay
/// alive across tasks until [`stop`] is called.
///
/// ## Features
///
/// - ✅ Direct handoff to idle workers, no task buffering
/// - ✅ Backpressure: [`submit`] waits while every worker is busy
/// - ✅ Panicking tasks never leak a budget permit
/// - ❌ No ordering between submitted tasks
/// - ❌ No resizing after construction
///
/// ## Shutdown
///
/// [`stop`] posts exactly `capacity` stop signals and returns. Workers finish
/// their current task before consuming a signal, so in-flight work drains
/// instead of being aborted. Signals that no worker consumes stay buffered
/// and are harmless.
///
/// Dropping the pool disconnects its channels: idle workers exit once they
/// run out of buffered stop signals, and busy workers exit after their current
/// task.
///
/// # Example
///
/// ```
/// # #[cfg(feature = "async-tokio")]
/// # {
/// use corral::{TokioRuntime, WorkerPool, wait_for_zero_async};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let pool = WorkerPool::<TokioRuntime>::new(4);
/// let pending = Arc::new(AtomicUsize::new(16));
///
/// for _ in 0..16 {
///     let pending = Arc::clone(&pending);
///     pool.submit(async move {
///         pending.fetch_sub(1, Ordering::AcqRel);
///     })
///     .await;
/// }
///
/// wait_for_zero_async::<TokioRuntime, _>(&*pending).await;
/// assert!(pool.active_workers() <= 4);
/// pool.stop();
/// # });
/// # }
/// ```
///
/// [`capacity`]: WorkerPool::capacity
/// [`stop`]: WorkerPool::stop
/// [`submit`]: WorkerPool::submit
pub struct WorkerPool<R> {
    name: Arc<str>,
    capacity: usize,
    budget: Arc<Semaphore>,
    idle_rx: Receiver<Slot>,
    stop_tx: Sender<()>,
    context: Arc<WorkerContext>,
    next_worker_id: AtomicUsize,
    _runtime: PhantomData<fn() -> R>,
}

/// What a waiting submitter obtained first.
enum Ready {
    Idle(Slot),
    Budget(OwnedSemaphorePermit),
}

impl<R> WorkerPool<R>
where
    R: RuntimeProvider,
{
    /// Creates a pool that runs at most `capacity` workers at once, with the
    /// default name and panic handling.
    ///
    /// No worker is started until the first submission.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`Semaphore::MAX_PERMITS`].
    pub fn new(capacity: usize) -> Self {
        PoolBuilder::new(capacity).build()
    }

    /// Returns a [`PoolBuilder`] to configure a pool of `capacity` workers.
    pub fn builder(capacity: usize) -> PoolBuilder<R> {
        PoolBuilder::new(capacity)
    }

    pub(crate) fn from_builder(builder: PoolBuilder<R>) -> Self {
        let capacity = builder.capacity;
        let name: Arc<str> = builder
            .name
            .as_deref()
            .unwrap_or(DEFAULT_POOL_NAME)
            .into();

        let (idle_tx, idle_rx) = flume::unbounded();
        let (stop_tx, stop_rx) = flume::bounded(capacity);

        let context = Arc::new(WorkerContext {
            idle_tx,
            stop_rx,
            idle: AtomicUsize::new(0),
            panic_handler: builder.task_panic_handler,
            #[cfg(feature = "tracing")]
            name: Arc::clone(&name),
        });

        Self {
            name,
            capacity,
            budget: Arc::new(Semaphore::new(capacity)),
            idle_rx,
            stop_tx,
            context,
            next_worker_id: AtomicUsize::new(0),
            _runtime: PhantomData,
        }
    }

    /// Returns the pool's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the maximum number of concurrently live workers.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of live workers, busy or idle.
    ///
    /// Equal to the number of budget permits currently held.
    pub fn active_workers(&self) -> usize {
        self.capacity - self.budget.available_permits()
    }

    /// Returns the number of workers currently parked waiting for a task.
    pub fn idle_workers(&self) -> usize {
        self.context.idle.load(Ordering::Acquire)
    }

    /// Submits `task` for execution, waiting while the pool is saturated.
    ///
    /// The task is handed straight to an idle worker when there is one.
    /// Otherwise, if the pool has fewer than [`capacity`] live workers, a new
    /// worker is spawned with `task` as its first unit of work. If neither is
    /// possible the returned future waits until a worker parks or a permit is
    /// released, whichever happens first.
    ///
    /// Resolving only means the task has been handed over; it may still be
    /// running. A pool with zero capacity never resolves.
    ///
    /// Dropping the future before it resolves discards `task` without running
    /// it and without consuming any capacity.
    ///
    /// [`capacity`]: WorkerPool::capacity
    pub async fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit_task(Box::pin(task)).await;
    }

    /// Like [`WorkerPool::submit`], for an already boxed [`Task`].
    pub async fn submit_task(&self, mut task: Task) {
        loop {
            task = match self.try_submit_task(task) {
                Ok(()) => return,
                Err(err) => err.into_inner(),
            };

            // Neither channel closes while `self` is borrowed, so at least one
            // branch always stays enabled.
            let ready = tokio::select! {
                biased;
                Ok(slot) = self.idle_rx.recv_async() => Ready::Idle(slot),
                Ok(permit) = Arc::clone(&self.budget).acquire_owned() => Ready::Budget(permit),
            };

            match ready {
                Ready::Idle(slot) => match slot.send(task) {
                    Ok(()) => return,
                    // The worker stopped after parking; try again.
                    Err(returned) => task = returned,
                },
                Ready::Budget(permit) => {
                    self.spawn_worker(task, permit);
                    return;
                }
            }
        }
    }

    /// Attempts to submit `task` without waiting.
    ///
    /// # Errors
    ///
    /// Returns a [`TrySubmitError`] holding the boxed task if no worker is idle
    /// and every budget permit is taken ([`Error::PoolFull`]).
    pub fn try_submit<F>(&self, task: F) -> Result<(), TrySubmitError<Task>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.try_submit_task(Box::pin(task))
    }

    /// Like [`WorkerPool::try_submit`], for an already boxed [`Task`].
    ///
    /// # Errors
    ///
    /// See [`WorkerPool::try_submit`].
    pub fn try_submit_task(&self, mut task: Task) -> Result<(), TrySubmitError<Task>> {
        // Stale slots belong to workers that stopped after parking. Each failed
        // handoff discards one of them.
        while let Ok(slot) = self.idle_rx.try_recv() {
            match slot.send(task) {
                Ok(()) => return Ok(()),
                Err(returned) => task = returned,
            }
        }

        match Arc::clone(&self.budget).try_acquire_owned() {
            Ok(permit) => {
                self.spawn_worker(task, permit);
                Ok(())
            }
            // The budget semaphore is never closed.
            Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => {
                Err(TrySubmitError::new(task, Error::PoolFull))
            }
        }
    }

    /// Signals every worker to exit once its current task is done.
    ///
    /// Posts exactly [`capacity`] stop signals, however many workers are alive,
    /// and returns without waiting for them to drain. Signals that do not fit
    /// because earlier ones are still unconsumed are dropped.
    ///
    /// The pool stays usable: a later submission spawns a fresh worker.
    ///
    /// [`capacity`]: WorkerPool::capacity
    pub fn stop(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Stopping pool {} ({} live workers, {} signals)",
            self.name,
            self.active_workers(),
            self.capacity
        );

        let mut _dropped = 0_usize;
        for _ in 0..self.capacity {
            match self.stop_tx.try_send(()) {
                Ok(()) => {}
                Err(TrySendError::Full(()) | TrySendError::Disconnected(())) => _dropped += 1,
            }
        }

        #[cfg(feature = "tracing")]
        if _dropped > 0 {
            tracing::debug!(
                "Pool {} dropped {} stop signals, earlier signals are still pending",
                self.name,
                _dropped
            );
        }
    }

    fn spawn_worker(&self, first: Task, permit: OwnedSemaphorePermit) {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let worker = Worker::new(id, Arc::clone(&self.context), permit);
        R::spawn(worker.run(first));
    }
}

impl<R> fmt::Debug for WorkerPool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field(
                "active_workers",
                &(self.capacity - self.budget.available_permits()),
            )
            .field("idle_workers", &self.context.idle.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
