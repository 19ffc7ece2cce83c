//! Blocking spin-waits driven by [`Backoff`].
//!
//! These helpers poll a condition in a loop and never park on an external
//! wakeup. Between polls they yield the OS thread following the exponential
//! [`Backoff`] schedule, so short waits stay low-latency while long waits burn
//! at most [`BACKOFF_CEILING`] yields per poll.
//!
//! Only use them for conditions expected to clear within microseconds to a
//! few milliseconds. Anything longer should block on a real synchronization
//! primitive instead.
//!
//! [`BACKOFF_CEILING`]: crate::BACKOFF_CEILING

use crate::{AtomicCounter, Backoff};

/// Spins until `busy` returns `false`, yielding the current thread between
/// polls.
///
/// The predicate is evaluated once per round. If it is already `false` on the
/// first evaluation, the call returns immediately without yielding.
///
/// Returns the total number of yields performed.
///
/// # Example
///
/// ```
/// use corral::wait_on;
///
/// let mut polls = 0;
/// let yields = wait_on(|| {
///     polls += 1;
///     polls < 3
/// });
/// assert_eq!(polls, 3);
/// assert_eq!(yields, 1 + 2);
/// ```
pub fn wait_on(busy: impl FnMut() -> bool) -> u64 {
    wait_on_with(busy, std::thread::yield_now)
}

/// Like [`wait_on`], but yields through `yield_fn` instead of
/// [`std::thread::yield_now`].
///
/// Useful for spinning with [`core::hint::spin_loop`] or for instrumenting the
/// yields in tests.
pub fn wait_on_with(mut busy: impl FnMut() -> bool, mut yield_fn: impl FnMut()) -> u64 {
    let mut backoff = Backoff::new();
    let mut total = 0_u64;
    while busy() {
        total += u64::from(backoff.snooze_with(&mut yield_fn));
    }
    total
}

/// Spins until `counter` drops to zero or below.
///
/// Equivalent to `wait_on(|| counter.is_positive())`.
///
/// # Example
///
/// ```
/// use corral::wait_for_zero;
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use std::sync::Arc;
///
/// let pending = Arc::new(AtomicI64::new(4));
/// std::thread::scope(|s| {
///     for _ in 0..4 {
///         let pending = Arc::clone(&pending);
///         s.spawn(move || {
///             pending.fetch_sub(1, Ordering::AcqRel);
///         });
///     }
///     wait_for_zero(&*pending);
/// });
/// assert_eq!(pending.load(Ordering::Acquire), 0);
/// ```
pub fn wait_for_zero<C>(counter: &C) -> u64
where
    C: AtomicCounter + ?Sized,
{
    wait_on(|| counter.is_positive())
}
