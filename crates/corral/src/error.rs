use core::fmt;

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `corral` can emit.
///
/// The blocking primitives (`lock`, `submit`, `wait_on`, ...) never fail. The
/// variants below only surface from the non-blocking `try_*` entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// [`crate::ChanMutex::try_unlock`] was called while the mutex was free.
    #[error("mutex is not locked")]
    NotLocked,

    /// A non-blocking submission found no idle worker and no free budget
    /// permit.
    #[error("worker pool is at capacity")]
    PoolFull,
}

/// Error returned by a non-blocking submission, handing the rejected task back
/// to the caller.
pub struct TrySubmitError<T> {
    task: T,
    kind: Error,
}

impl<T> TrySubmitError<T> {
    #[cfg_attr(not(feature = "pool"), allow(dead_code))]
    pub(crate) const fn new(task: T, kind: Error) -> Self {
        Self { task, kind }
    }

    /// Returns why the submission was rejected.
    pub const fn kind(&self) -> Error {
        self.kind
    }

    /// Consumes the error, returning the task that could not be submitted.
    pub fn into_inner(self) -> T {
        self.task
    }
}

impl<T> fmt::Debug for TrySubmitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrySubmitError")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for TrySubmitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl<T> core::error::Error for TrySubmitError<T> {}

impl<T> From<TrySubmitError<T>> for Error {
    fn from(err: TrySubmitError<T>) -> Self {
        err.kind
    }
}
