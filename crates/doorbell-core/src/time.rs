//! Monotonic time source

/// Monotonic millisecond clock.
///
/// Waiting is done through [`embedded_hal_async::delay::DelayNs`]; this trait
/// only answers "what time is it", which the console needs for its read
/// deadline.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin (usually boot).
    fn now_ms(&self) -> u64;
}

/// A point in time after which a blocking wait gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at_ms: u64,
}

impl Deadline {
    pub fn after<C: Clock>(clock: &C, timeout_ms: u64) -> Self {
        Self {
            at_ms: clock.now_ms().saturating_add(timeout_ms),
        }
    }

    pub fn has_passed<C: Clock>(&self, clock: &C) -> bool {
        clock.now_ms() >= self.at_ms
    }
}
