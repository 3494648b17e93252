//! Time source and monotonic clock contracts

use embassy_time::{Duration, Instant};

/// Timestamp with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    /// Unix timestamp in seconds since epoch (1970-01-01 00:00:00 UTC)
    pub unix_secs: u64,
    /// Microseconds component (0-999,999)
    pub micros: u32,
}

impl Timestamp {
    /// Create a new timestamp.
    pub const fn new(unix_secs: u64, micros: u32) -> Self {
        Self { unix_secs, micros }
    }

    /// Convert from an NTP timestamp (seconds since 1900-01-01 plus a
    /// 2^-32 fractional part).
    pub fn from_ntp(ntp_secs: u64, ntp_frac: u32) -> Self {
        /// NTP epoch offset (1900-01-01 to 1970-01-01 in seconds)
        const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

        let unix_secs = ntp_secs.saturating_sub(NTP_UNIX_OFFSET);
        let micros = ((ntp_frac as u64 * 1_000_000) >> 32) as u32;
        Self::new(unix_secs, micros)
    }
}

/// Monotonic clock: the only notion of "now" and "later" the core uses.
///
/// Implementations back this with whatever timer the platform has; tests
/// back it with a virtual timeline.
pub trait Monotonic {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Yield for at least `duration`.
    fn sleep(&self, duration: Duration) -> impl core::future::Future<Output = ()>;

    /// Yield until `deadline` has passed.
    fn sleep_until(&self, deadline: Instant) -> impl core::future::Future<Output = ()>;
}

impl<M: Monotonic> Monotonic for &M {
    fn now(&self) -> Instant {
        (**self).now()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }

    async fn sleep_until(&self, deadline: Instant) {
        (**self).sleep_until(deadline).await;
    }
}

/// Contract a remote time source must satisfy.
///
/// `begin_sync` only starts the exchange; the source reports completion by
/// raising the signal handle it was wired to at construction, from a
/// context that does nothing else. The scheduler polls that signal.
pub trait TimeSource {
    /// Start one synchronization exchange against the given servers,
    /// applying the civil-time offset rule. Must not block.
    fn begin_sync(&mut self, servers: &'static [&'static str], offset_rule: &'static str);

    /// Current synchronized time, or `None` before the first completed
    /// exchange.
    fn now(&self) -> Option<Timestamp>;
}

impl<T: TimeSource> TimeSource for &mut T {
    fn begin_sync(&mut self, servers: &'static [&'static str], offset_rule: &'static str) {
        (**self).begin_sync(servers, offset_rule);
    }

    fn now(&self) -> Option<Timestamp> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntp_epoch_maps_to_unix_epoch() {
        const NTP_UNIX_OFFSET: u64 = 2_208_988_800;
        let ts = Timestamp::from_ntp(NTP_UNIX_OFFSET, 0);
        assert_eq!(ts.unix_secs, 0);
        assert_eq!(ts.micros, 0);
    }

    #[test]
    fn ntp_fraction_converts_to_micros() {
        // 0x8000_0000 is exactly half a second.
        let ts = Timestamp::from_ntp(2_208_988_800 + 10, 0x8000_0000);
        assert_eq!(ts.unix_secs, 10);
        assert_eq!(ts.micros, 500_000);
    }

    #[test]
    fn pre_unix_ntp_times_saturate() {
        let ts = Timestamp::from_ntp(100, 0);
        assert_eq!(ts.unix_secs, 0);
    }
}
