//! Periodic sync trigger
//!
//! Raises the due-flag once per resync interval. Deadlines walk forward
//! from schedule time, not from completion of the previous sync, so a slow
//! or failed attempt never delays the next period. Raising a flag that is
//! still pending simply re-asserts it.
//!
//! The "due once at startup" rule is expressed at construction of the flag
//! itself: build it with `SyncSignal::new(true)`.

use embassy_time::{Duration, Instant};
use hal_abstractions::{Monotonic, SyncSignal};

pub struct PeriodicTrigger<'a, M: Monotonic> {
    due: &'a SyncSignal,
    clock: M,
    interval: Duration,
    next: Option<Instant>,
}

impl<'a, M: Monotonic> PeriodicTrigger<'a, M> {
    pub fn new(due: &'a SyncSignal, clock: M, interval_hours: u32) -> Self {
        Self {
            due,
            clock,
            interval: Duration::from_secs(interval_hours as u64 * 3_600),
            next: None,
        }
    }

    /// Sleep through one period, then mark a sync as due.
    pub async fn wait_and_raise(&mut self) {
        let deadline = self
            .next
            .unwrap_or_else(|| self.clock.now() + self.interval);
        self.clock.sleep_until(deadline).await;
        self.next = Some(deadline + self.interval);
        self.due.raise();
    }

    /// Run forever; join this with the cooperative loop.
    pub async fn run(mut self) -> ! {
        loop {
            self.wait_and_raise().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embassy_futures::block_on;

    const DAY_MS: u64 = 24 * 3_600 * 1_000;

    struct FakeClock {
        now_ms: Cell<u64>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now_ms: Cell::new(0),
            }
        }
    }

    impl Monotonic for FakeClock {
        fn now(&self) -> Instant {
            Instant::from_millis(self.now_ms.get())
        }

        async fn sleep(&self, duration: Duration) {
            self.now_ms.set(self.now_ms.get() + duration.as_millis());
        }

        async fn sleep_until(&self, deadline: Instant) {
            self.now_ms
                .set(self.now_ms.get().max(deadline.as_millis()));
        }
    }

    #[test]
    fn due_at_start_then_once_per_period() {
        let due = SyncSignal::new(true);
        let clock = FakeClock::new();
        let mut trigger = PeriodicTrigger::new(&due, &clock, 24);

        // The startup assertion is consumed exactly once.
        assert!(due.take());
        assert!(!due.take());

        block_on(trigger.wait_and_raise());
        assert_eq!(clock.now_ms.get(), DAY_MS);
        assert!(due.take());
        assert!(!due.take());
    }

    #[test]
    fn deadlines_measure_from_schedule_time() {
        let due = SyncSignal::new(true);
        let clock = FakeClock::new();
        let mut trigger = PeriodicTrigger::new(&due, &clock, 24);

        block_on(trigger.wait_and_raise());
        // A long-running sync attempt eats an hour of wall time...
        block_on(clock.sleep(Duration::from_secs(3_600)));
        block_on(trigger.wait_and_raise());
        // ...yet the second deadline still lands exactly two periods in.
        assert_eq!(clock.now_ms.get(), 2 * DAY_MS);
    }

    #[test]
    fn coincident_triggers_collapse_into_one_flag() {
        let due = SyncSignal::new(false);
        let clock = FakeClock::new();
        let mut trigger = PeriodicTrigger::new(&due, &clock, 1);

        block_on(trigger.wait_and_raise());
        block_on(trigger.wait_and_raise());
        // Two periods elapsed without a consumer; the flag is one bit.
        assert!(due.take());
        assert!(!due.take());
    }
}
