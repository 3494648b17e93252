//! Time synchronization scheduler
//!
//! Decides whether a sync is due and, when it is, drives the full
//! connect -> exchange -> disconnect sequence exactly once, then hands
//! control back to the cooperative loop. Every wait in here is a bounded
//! poll-with-sleep, so a `tick()` can never stall sibling tasks; the worst
//! case is `max_attempts * attempt_timeout + exchange_timeout`.

use hal_abstractions::{
    Console, LinkState, Monotonic, NetworkLink, SyncSignal, TimeSource, Timestamp,
};

use crate::config::{ConfigError, Settings};
use crate::error::SyncError;
use crate::report::StatusReporter;
use crate::tz::{format_local, TzRule};

/// What one `tick()` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// No sync was due; nothing happened.
    Idle,
    /// The exchange completed; the clock now holds this time.
    Synced(Timestamp),
    /// The attempt failed and was absorbed; the next trigger retries.
    Failed(SyncError),
}

/// Owner of the sync policy and, for the span of one tick, of the radio.
pub struct SyncScheduler<'a, L, T, M, C>
where
    L: NetworkLink,
    T: TimeSource,
    M: Monotonic,
    C: Console,
{
    link: L,
    source: T,
    clock: M,
    reporter: StatusReporter<C>,
    settings: &'a Settings,
    rule: TzRule<'static>,
    due: &'a SyncSignal,
    done: &'a SyncSignal,
}

impl<'a, L, T, M, C> SyncScheduler<'a, L, T, M, C>
where
    L: NetworkLink,
    T: TimeSource,
    M: Monotonic,
    C: Console,
{
    /// Wire the scheduler to its collaborators. `due` is raised by the
    /// periodic trigger, `done` by the time source's completion context.
    pub fn new(
        link: L,
        source: T,
        clock: M,
        reporter: StatusReporter<C>,
        settings: &'a Settings,
        due: &'a SyncSignal,
        done: &'a SyncSignal,
    ) -> Result<Self, ConfigError> {
        let rule = settings.validate()?;
        Ok(Self {
            link,
            source,
            clock,
            reporter,
            settings,
            rule,
            due,
            done,
        })
    }

    /// Run one scheduling decision.
    ///
    /// Returns immediately when no sync is due. Otherwise performs exactly
    /// one connect -> exchange -> disconnect sequence; the link is released
    /// on every path before this returns. Failures are absorbed, reported,
    /// and left for the next scheduled trigger.
    pub async fn tick(&mut self) -> TickOutcome {
        // Taking the flag before the attempt is deliberate policy: a failed
        // attempt forfeits this period instead of retrying immediately.
        if !self.due.take() {
            return TickOutcome::Idle;
        }

        self.reporter.line(format_args!(
            "Time sync due, connecting to {}",
            self.settings.network.ssid
        ));

        let result = match self.acquire_connection().await {
            Ok(attempts) => {
                self.reporter
                    .line(format_args!("Link up after {} attempt(s)", attempts));
                self.run_exchange().await
            }
            Err(e) => Err(e),
        };

        // The radio never stays powered past a tick, success or not.
        self.link.disconnect();

        match result {
            Ok(timestamp) => {
                self.reporter.line(format_args!(
                    "Time synchronized: {}",
                    format_local(timestamp.unix_secs, &self.rule)
                ));
                TickOutcome::Synced(timestamp)
            }
            Err(e) => {
                self.reporter.line(format_args!("Time sync failed: {}", e));
                TickOutcome::Failed(e)
            }
        }
    }

    /// Bring the link up, retrying within the connection policy.
    ///
    /// Each attempt gets its own full timeout window; a terminal failure
    /// report from the driver ends an attempt early. Returns the number of
    /// attempts used.
    async fn acquire_connection(&mut self) -> Result<u32, SyncError> {
        let policy = &self.settings.connection;
        for attempt in 1..=policy.max_attempts {
            self.link.begin_connect(
                self.settings.network.ssid,
                self.settings.network.credential,
            );
            let deadline = self.clock.now() + policy.attempt_timeout;
            loop {
                match self.link.state() {
                    LinkState::Connected => return Ok(attempt),
                    LinkState::Failed => break,
                    LinkState::Disconnected | LinkState::Connecting => {}
                }
                if self.clock.now() >= deadline {
                    break;
                }
                self.clock.sleep(policy.poll_interval).await;
            }
        }
        Err(SyncError::ConnectionExhausted)
    }

    /// Run one exchange and wait for its completion signal.
    ///
    /// Waiting ends on the first of: completion raised, link observed down,
    /// exchange timeout. There is no rollback on failure; the source's
    /// clock either landed atomically or kept its previous value.
    async fn run_exchange(&mut self) -> Result<Timestamp, SyncError> {
        let policy = &self.settings.sync;
        self.done.clear();
        self.source
            .begin_sync(policy.servers, policy.offset_rule);
        let deadline = self.clock.now() + policy.exchange_timeout;
        loop {
            if self.done.is_raised() {
                // Completion without a readable clock counts as a timeout.
                return self.source.now().ok_or(SyncError::SyncTimedOut);
            }
            if self.link.state() != LinkState::Connected {
                return Err(SyncError::SyncAbortedDisconnected);
            }
            if self.clock.now() >= deadline {
                return Err(SyncError::SyncTimedOut);
            }
            self.clock.sleep(policy.poll_interval).await;
        }
    }
}
