use super::{PanicHandler, Task};
use ::futures::FutureExt;
use core::panic::AssertUnwindSafe;
use flume::{Receiver, Sender};
use portable_atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, oneshot};

/// The sending half of an idle worker's task slot, claimed by a submitter.
pub(crate) type Slot = oneshot::Sender<Task>;

/// State shared by every worker of one pool.
///
/// Workers hold the pool's idle-queue sender and stop-signal receiver, never
/// the opposite ends. Dropping the pool therefore disconnects both channels
/// and lets parked workers exit.
pub(crate) struct WorkerContext {
    pub(crate) idle_tx: Sender<Slot>,
    pub(crate) stop_rx: Receiver<()>,
    pub(crate) idle: AtomicUsize,
    pub(crate) panic_handler: Option<Arc<PanicHandler>>,
    #[cfg(feature = "tracing")]
    pub(crate) name: Arc<str>,
}

/// What woke a parked worker.
enum Wake {
    /// A submitter handed over a task.
    Task(Task),
    /// A stop signal arrived, but a submitter claimed the slot at the same
    /// time. The task still has to run before the worker exits.
    Last(Task),
    /// A stop signal arrived or the pool is gone.
    Stop,
}

/// A live worker: one spawned task owning one budget permit.
///
/// The permit is released when the worker is dropped, whether it exits
/// through a stop signal or by unwinding.
pub(crate) struct Worker {
    #[cfg(feature = "tracing")]
    id: usize,
    context: Arc<WorkerContext>,
    _permit: OwnedSemaphorePermit,
}

impl Worker {
    pub(crate) fn new(
        _id: usize,
        context: Arc<WorkerContext>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            #[cfg(feature = "tracing")]
            id: _id,
            context,
            _permit: permit,
        }
    }

    /// Runs `first`, then keeps taking handed-off tasks until stopped.
    ///
    /// Execution and parking strictly alternate, so a worker never holds more
    /// than one task.
    pub(crate) async fn run(self, first: Task) {
        #[cfg(feature = "tracing")]
        tracing::trace!("Worker {} of pool {} started", self.id, self.context.name);

        self.execute(first).await;

        loop {
            match self.park().await {
                Wake::Task(task) => self.execute(task).await,
                Wake::Last(task) => {
                    self.execute(task).await;
                    break;
                }
                Wake::Stop => break,
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!("Worker {} of pool {} stopped", self.id, self.context.name);
    }

    /// Advertises this worker as idle and waits for a task or a stop signal.
    ///
    /// A pending task wins over a pending stop signal.
    async fn park(&self) -> Wake {
        loop {
            let (slot_tx, mut slot_rx) = oneshot::channel();
            if self.context.idle_tx.send(slot_tx).is_err() {
                return Wake::Stop;
            }

            self.context.idle.fetch_add(1, Ordering::AcqRel);
            let handed = tokio::select! {
                biased;
                task = &mut slot_rx => Some(task),
                _ = self.context.stop_rx.recv_async() => None,
            };
            self.context.idle.fetch_sub(1, Ordering::AcqRel);

            match handed {
                Some(Ok(task)) => return Wake::Task(task),
                // The slot was discarded without a task; advertise a new one.
                Some(Err(_)) => continue,
                None => {
                    // Closing the slot makes any later handoff fail back to its
                    // submitter. A task that got in first must still run.
                    slot_rx.close();
                    return match slot_rx.try_recv() {
                        Ok(task) => Wake::Last(task),
                        Err(_) => Wake::Stop,
                    };
                }
            }
        }
    }

    /// Runs one task, routing a panic to the pool's handler instead of letting
    /// it take the worker down.
    async fn execute(&self, task: Task) {
        let Err(payload) = AssertUnwindSafe(task).catch_unwind().await else {
            return;
        };

        match &self.context.panic_handler {
            Some(handler) => handler(payload),
            None => {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    "Task on worker {} of pool {} panicked: {}",
                    self.id,
                    self.context.name,
                    panic_message(payload.as_ref())
                );
                #[cfg(not(feature = "tracing"))]
                drop(payload);
            }
        }
    }
}

#[cfg(feature = "tracing")]
fn panic_message(payload: &(dyn core::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("Box<dyn Any>")
}
