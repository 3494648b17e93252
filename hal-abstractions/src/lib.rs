//! Hardware and collaborator abstraction traits for nettime firmware
//!
//! This crate defines the seams between the synchronization core and the
//! platform: the radio link, the remote time source, the monotonic clock
//! and the debug console. BSPs and network stacks implement these traits;
//! the core only ever talks to the traits, which keeps it host-testable.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod console;
pub mod network;
pub mod signal;
pub mod time;

pub use console::{Console, WriteConsole};
pub use network::{LinkState, NetworkLink};
pub use signal::SyncSignal;
pub use time::{Monotonic, TimeSource, Timestamp};

// Time vocabulary shared by every implementor.
pub use embassy_time::{Duration, Instant};
