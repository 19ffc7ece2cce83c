/// The largest number of yields a single [`Backoff`] step performs.
pub const BACKOFF_CEILING: u32 = 32;

/// Exponential backoff state for a single spin-wait.
///
/// Each call to [`Backoff::advance`] returns how many times the caller should
/// yield before polling again, then doubles that amount for the next round,
/// saturating at [`BACKOFF_CEILING`]. The resulting schedule is `1, 2, 4, 8,
/// 16, 32, 32, ...`.
///
/// The state is meant to live on the stack of one waiting call. It is never
/// shared between waiters.
///
/// # Example
///
/// ```
/// use corral::Backoff;
///
/// let mut backoff = Backoff::new();
/// let schedule: Vec<u32> = (0..7).map(|_| backoff.advance()).collect();
/// assert_eq!(schedule, [1, 2, 4, 8, 16, 32, 32]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    /// Creates a fresh backoff whose next step yields once.
    pub const fn new() -> Self {
        Self { step: 1 }
    }

    /// Returns the number of yields the next step will perform.
    pub const fn step(&self) -> u32 {
        self.step
    }

    /// Returns `true` once the schedule has reached [`BACKOFF_CEILING`].
    pub const fn is_saturated(&self) -> bool {
        self.step >= BACKOFF_CEILING
    }

    /// Restarts the schedule from a single yield.
    pub const fn reset(&mut self) {
        self.step = 1;
    }

    /// Consumes the current step, returning its yield count and doubling the
    /// next one up to the ceiling.
    pub fn advance(&mut self) -> u32 {
        let current = self.step;
        self.step = (current << 1).min(BACKOFF_CEILING);
        current
    }

    /// Runs one step of the schedule, calling `yield_fn` once per yield.
    ///
    /// Returns the number of yields performed.
    pub fn snooze_with(&mut self, mut yield_fn: impl FnMut()) -> u32 {
        let yields = self.advance();
        for _ in 0..yields {
            yield_fn();
        }
        yields
    }

    /// Runs one step of the schedule by yielding the current OS thread.
    pub fn snooze(&mut self) -> u32 {
        self.snooze_with(std::thread::yield_now)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
