use crate::RuntimeProvider;
use core::future::Future;

/// An implementation of [`RuntimeProvider`] backed by the
/// [`smol`](https://docs.rs/smol) global executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmolRuntime;

impl RuntimeProvider for SmolRuntime {
    fn spawn<F>(future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        smol::spawn(future).detach();
    }

    fn yield_now() -> impl Future<Output = ()> + Send {
        smol::future::yield_now()
    }
}
