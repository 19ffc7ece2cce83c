//! Bounded worker pool with lazily spawned, reusable workers.
//!
//! A [`WorkerPool`] runs submitted tasks on at most `capacity` concurrently
//! live workers. There is no scheduler task: submitters and workers meet
//! directly.
//!
//! - An idle worker parks by publishing a one-shot task slot on the pool's idle
//!   queue. A submitter that claims the slot hands its task straight to that
//!   worker. Tasks are never buffered; only worker readiness is queued.
//! - When no worker is idle, a submitter takes a permit from the budget
//!   semaphore and spawns a new worker with its task as the first unit of
//!   work. The worker holds the permit until it exits.
//! - When neither is possible, [`WorkerPool::submit`] waits for whichever comes
//!   first. This is the pool's only form of backpressure.
//! - [`WorkerPool::stop`] posts one stop signal per budget permit. Each worker
//!   consumes a signal after it finishes its current task and exits.

mod builder;
mod worker_pool;
mod task;
mod worker;

pub use builder::*;
pub use worker_pool::*;
pub use task::*;

#[cfg(all(test, feature = "async-tokio"))]
mod tests;
