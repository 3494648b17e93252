//! Single-producer/single-consumer boolean signals
//!
//! One context raises the flag, one context consumes it; no other shared
//! state crosses the boundary, so plain atomic load/store is enough.

use core::sync::atomic::{AtomicBool, Ordering};

/// A one-bit signal between an asynchronous producer (alarm callback,
/// completion notification) and the cooperative loop that polls it.
#[derive(Debug)]
pub struct SyncSignal {
    raised: AtomicBool,
}

impl SyncSignal {
    /// Create a signal, usually in a `static`.
    pub const fn new(initial: bool) -> Self {
        Self {
            raised: AtomicBool::new(initial),
        }
    }

    /// Assert the signal. Raising an already-raised signal is a no-op.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Drop any pending assertion.
    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }

    /// Consume the signal: returns whether it was raised and clears it in
    /// the same atomic step.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    /// Observe without consuming.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_a_raise() {
        let signal = SyncSignal::new(false);
        assert!(!signal.take());
        signal.raise();
        assert!(signal.is_raised());
        assert!(signal.take());
        assert!(!signal.is_raised());
        assert!(!signal.take());
    }

    #[test]
    fn initial_value_is_observable() {
        let signal = SyncSignal::new(true);
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn double_raise_is_idempotent() {
        let signal = SyncSignal::new(false);
        signal.raise();
        signal.raise();
        assert!(signal.take());
        assert!(!signal.take());
    }
}
