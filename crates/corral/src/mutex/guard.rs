use crate::ChanMutex;

/// RAII guard for a held [`ChanMutex`].
///
/// The lock is released when the guard is dropped. The guard owns that
/// release: calling [`ChanMutex::unlock`] while a guard is alive is a contract
/// violation, since the mutex does not track its holder and a later drop could
/// release someone else's lock.
///
/// # Panics
///
/// Dropping the guard panics if the mutex was already unlocked, unless the
/// thread is already unwinding.
#[must_use = "if unused the ChanMutex will immediately unlock"]
#[derive(Debug)]
pub struct ChanMutexGuard<'a> {
    mutex: &'a ChanMutex,
}

impl<'a> ChanMutexGuard<'a> {
    pub(crate) const fn new(mutex: &'a ChanMutex) -> Self {
        Self { mutex }
    }

    /// Returns the mutex this guard holds.
    pub const fn mutex(&self) -> &'a ChanMutex {
        self.mutex
    }
}

impl Drop for ChanMutexGuard<'_> {
    fn drop(&mut self) {
        if self.mutex.try_unlock().is_err() && !std::thread::panicking() {
            panic!("ChanMutexGuard dropped after its mutex was unlocked");
        }
    }
}
