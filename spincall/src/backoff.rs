//! Busy-wait strategies used between polls of the call slot.

/// A short pause performed between consecutive polls of the slot.
///
/// Both the requester (while waiting for completion) and the responder
/// (while idle) relax through the same strategy, so one implementation sets
/// the timing behavior of the whole pair.
pub trait Backoff {
    fn relax(&self);
}

/// Default number of `spin_loop` hints per relax.
pub const DEFAULT_SPINS: u32 = 3;

/// Fixed-count hardware relax hints. The default strategy.
#[derive(Debug, Clone, Copy)]
pub struct SpinBackoff {
    spins: u32,
}

impl SpinBackoff {
    pub const fn new(spins: u32) -> Self {
        Self { spins }
    }
}

impl Default for SpinBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_SPINS)
    }
}

impl Backoff for SpinBackoff {
    #[inline]
    fn relax(&self) {
        for _ in 0..self.spins {
            std::hint::spin_loop();
        }
    }
}

/// Yields the timeslice to the OS scheduler between polls.
///
/// Loses the latency advantage of pure spinning; useful when the pair is
/// oversubscribed on fewer cores than threads, e.g. in CI.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldBackoff;

impl Backoff for YieldBackoff {
    #[inline]
    fn relax(&self) {
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_spin_is_noop() {
        SpinBackoff::new(0).relax();
    }

    #[test]
    fn test_yield_relax() {
        YieldBackoff.relax();
    }
}
