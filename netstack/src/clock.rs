//! Platform timer queue behind the `Monotonic` contract.

use embassy_time::{Duration, Instant, Timer};
use hal_abstractions::Monotonic;

/// The `embassy-time` driver as a `Monotonic`. Zero-sized; copy freely
/// into every task that needs a clock.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemMonotonic;

impl Monotonic for SystemMonotonic {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        Timer::after(duration).await;
    }

    async fn sleep_until(&self, deadline: Instant) {
        Timer::at(deadline).await;
    }
}
