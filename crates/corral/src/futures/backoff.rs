use super::RuntimeProvider;
use crate::{AtomicCounter, Backoff};

/// Async counterpart of [`crate::wait_on`].
///
/// Polls `busy` until it returns `false`. Between polls the task yields to the
/// runtime `R` following the [`Backoff`] schedule instead of yielding the OS
/// thread, so other tasks on the same worker thread keep making progress.
///
/// Returns the total number of yields performed.
pub async fn wait_on_async<R>(mut busy: impl FnMut() -> bool) -> u64
where
    R: RuntimeProvider,
{
    let mut backoff = Backoff::new();
    let mut total = 0_u64;
    while busy() {
        let yields = backoff.advance();
        for _ in 0..yields {
            R::yield_now().await;
        }
        total += u64::from(yields);
    }
    total
}

/// Async counterpart of [`crate::wait_for_zero`].
///
/// Resolves once `counter` holds a value of zero or below.
pub async fn wait_for_zero_async<R, C>(counter: &C) -> u64
where
    R: RuntimeProvider,
    C: AtomicCounter + ?Sized,
{
    wait_on_async::<R>(|| counter.is_positive()).await
}
