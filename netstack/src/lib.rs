//! # nettime embassy collaborators
//!
//! `embassy-net`/`embassy-time` backed implementations of the collaborator
//! contracts from `hal-abstractions`: a [`SystemMonotonic`] clock and an
//! SNTP time source split into a non-blocking [`sntp::SntpHandle`] for the
//! scheduler and an [`sntp::SntpRunner`] task that owns the socket work.
//!
//! The crate is platform-independent; the board brings its own network
//! driver and spawns the runner on its executor.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod clock;
pub mod sntp;

pub use clock::SystemMonotonic;
pub use sntp::{SntpConfig, SntpError, SntpHandle, SntpRunner, SntpState};
