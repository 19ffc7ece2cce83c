use crate::{ChanMutexGuard, Error, Result};
use flume::{Receiver, Sender, TrySendError};

/// A mutual-exclusion lock backed by a single-slot channel.
///
/// Locking deposits a token into the slot and unlocking removes it, so the
/// slot holds at most one token at any time. The lock protects no data of its
/// own and tracks no owner: whoever holds it is trusted to release it exactly
/// once.
///
/// ## Features
///
/// - ✅ Blocking ([`lock`]), async ([`lock_async`]) and non-blocking
///   ([`try_lock`]) acquisition on the same lock
/// - ✅ Explicit [`unlock`] or RAII release through [`ChanMutexGuard`]
/// - ❌ Not reentrant: a holder calling [`lock`] again deadlocks itself
/// - ❌ No fairness beyond what the underlying channel provides
///
/// ## Misuse
///
/// Unlocking a free mutex is a contract violation. [`unlock`] panics in that
/// case instead of hanging, and [`try_unlock`] reports it as
/// [`Error::NotLocked`].
///
/// # Example
///
/// ```
/// use corral::ChanMutex;
///
/// let mutex = ChanMutex::new();
/// mutex.lock();
/// assert!(!mutex.try_lock());
/// mutex.unlock();
/// assert!(mutex.try_lock());
/// mutex.unlock();
/// ```
///
/// [`lock`]: ChanMutex::lock
/// [`lock_async`]: ChanMutex::lock_async
/// [`try_lock`]: ChanMutex::try_lock
/// [`unlock`]: ChanMutex::unlock
/// [`try_unlock`]: ChanMutex::try_unlock
#[derive(Debug)]
pub struct ChanMutex {
    slot_tx: Sender<()>,
    slot_rx: Receiver<()>,
}

impl ChanMutex {
    /// Creates an unlocked mutex.
    pub fn new() -> Self {
        let (slot_tx, slot_rx) = flume::bounded(1);
        Self { slot_tx, slot_rx }
    }

    /// Blocks the current thread until the lock is acquired.
    pub fn lock(&self) {
        // Both ends live in `self`, so the channel cannot disconnect.
        let _ = self.slot_tx.send(());
    }

    /// Waits asynchronously until the lock is acquired.
    ///
    /// Dropping the returned future before it completes leaves the lock
    /// untouched.
    #[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
    #[cfg(feature = "futures")]
    pub async fn lock_async(&self) {
        let _ = self.slot_tx.send_async(()).await;
    }

    /// Attempts to acquire the lock without blocking.
    ///
    /// Returns `true` if the lock was free and is now held by the caller, or
    /// `false` with no side effect if it was already held.
    pub fn try_lock(&self) -> bool {
        match self.slot_tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(()) | TrySendError::Disconnected(())) => false,
        }
    }

    /// Releases the lock.
    ///
    /// The caller must currently hold the lock. Ownership is not tracked, so
    /// releasing a lock acquired by someone else succeeds silently.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is not locked.
    #[track_caller]
    pub fn unlock(&self) {
        if self.try_unlock().is_err() {
            panic!("unlock of an unlocked ChanMutex");
        }
    }

    /// Releases the lock, reporting a free mutex instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLocked`] if the slot was empty. The mutex is left
    /// unchanged in that case.
    pub fn try_unlock(&self) -> Result<()> {
        self.slot_rx.try_recv().map_err(|_| Error::NotLocked)
    }

    /// Returns `true` if the lock is currently held.
    ///
    /// The answer may be stale by the time the caller acts on it.
    pub fn is_locked(&self) -> bool {
        self.slot_tx.is_full()
    }

    /// Blocks until the lock is acquired and returns a guard that releases it
    /// on drop.
    pub fn lock_guard(&self) -> ChanMutexGuard<'_> {
        self.lock();
        ChanMutexGuard::new(self)
    }

    /// Asynchronously acquires the lock and returns a guard that releases it
    /// on drop.
    #[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
    #[cfg(feature = "futures")]
    pub async fn lock_guard_async(&self) -> ChanMutexGuard<'_> {
        self.lock_async().await;
        ChanMutexGuard::new(self)
    }

    /// Acquires the lock without blocking, returning a guard on success.
    pub fn try_lock_guard(&self) -> Option<ChanMutexGuard<'_>> {
        self.try_lock().then(|| ChanMutexGuard::new(self))
    }
}

impl Default for ChanMutex {
    fn default() -> Self {
        Self::new()
    }
}
