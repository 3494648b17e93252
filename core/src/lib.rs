//! # nettime core
//!
//! Platform-agnostic time synchronization core: the policy that decides
//! when to sync a device clock against network time, how to acquire and
//! release the radio around the attempt, how long to wait for the remote
//! source, and when the next attempt is due. Everything here runs inside a
//! single cooperative loop; every wait is a bounded poll-with-sleep.
//!
//! Hardware and network collaborators are reached only through the traits
//! in `hal-abstractions`, so the whole crate tests on the host with
//! scripted mocks and a virtual clock.
//!
//! ## Wiring
//!
//! ```ignore
//! static SYNC_DUE: SyncSignal = SyncSignal::new(true); // one sync due at boot
//! static SYNC_DONE: SyncSignal = SyncSignal::new(false);
//!
//! let settings = Settings::default();
//! let reporter = StatusReporter::new(console, settings.console.enabled);
//! let mut scheduler = SyncScheduler::new(
//!     link, source, clock, reporter, &settings, &SYNC_DUE, &SYNC_DONE,
//! )?;
//! let trigger = PeriodicTrigger::new(&SYNC_DUE, clock, settings.sync.resync_interval_hours);
//!
//! let loop_task = async {
//!     loop {
//!         scheduler.tick().await;
//!         clock.sleep(Duration::from_millis(100)).await;
//!     }
//! };
//! join(trigger.run(), loop_task).await;
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod calendar;
pub mod config;
pub mod error;
pub mod report;
pub mod scheduler;
pub mod trigger;
pub mod tz;

pub use config::{ConfigError, Settings};
pub use error::SyncError;
pub use report::StatusReporter;
pub use scheduler::{SyncScheduler, TickOutcome};
pub use trigger::PeriodicTrigger;
