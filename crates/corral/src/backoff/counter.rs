use core::sync::atomic::Ordering;

/// An atomic integer that a waiter can poll until it drains to zero.
///
/// The counter is considered busy while its value is strictly greater than
/// zero, so negative values (for signed counters) end a wait just like zero
/// does.
pub trait AtomicCounter {
    /// Returns `true` while the loaded value is greater than zero.
    fn is_positive(&self) -> bool;
}

macro_rules! impl_atomic_counter {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AtomicCounter for $ty {
                #[inline]
                fn is_positive(&self) -> bool {
                    self.load(Ordering::Acquire) > 0
                }
            }
        )*
    };
}

impl_atomic_counter!(
    core::sync::atomic::AtomicI8,
    core::sync::atomic::AtomicI16,
    core::sync::atomic::AtomicI32,
    core::sync::atomic::AtomicIsize,
    core::sync::atomic::AtomicU8,
    core::sync::atomic::AtomicU16,
    core::sync::atomic::AtomicU32,
    core::sync::atomic::AtomicUsize,
);

#[cfg(target_has_atomic = "64")]
impl_atomic_counter!(core::sync::atomic::AtomicI64, core::sync::atomic::AtomicU64);

impl_atomic_counter!(
    portable_atomic::AtomicI8,
    portable_atomic::AtomicI16,
    portable_atomic::AtomicI32,
    portable_atomic::AtomicI64,
    portable_atomic::AtomicIsize,
    portable_atomic::AtomicU8,
    portable_atomic::AtomicU16,
    portable_atomic::AtomicU32,
    portable_atomic::AtomicU64,
    portable_atomic::AtomicUsize,
);

impl<C: AtomicCounter + ?Sized> AtomicCounter for &C {
    #[inline]
    fn is_positive(&self) -> bool {
        (**self).is_positive()
    }
}

impl<C: AtomicCounter + ?Sized> AtomicCounter for std::sync::Arc<C> {
    #[inline]
    fn is_positive(&self) -> bool {
        (**self).is_positive()
    }
}
