use core::{any::Any, future::Future, pin::Pin};

/// A unit of work accepted by a [`crate::WorkerPool`].
///
/// Tasks take no input and produce no output. Submitted futures are boxed into
/// this type before they are handed to a worker.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A thread safe callback that receives the payload of a panicking task.
pub type PanicHandler = dyn Fn(Box<dyn Any + Send>) + Send + Sync;
