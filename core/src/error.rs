//! Error types for the synchronization core
//!
//! All of these are non-fatal: the scheduler absorbs them, releases the
//! link, and waits for the next scheduled trigger.

/// Why one synchronization attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    /// Every connection attempt ran out before the link came up.
    ConnectionExhausted,
    /// The exchange did not complete within its timeout.
    SyncTimedOut,
    /// The link dropped while the exchange was in flight.
    SyncAbortedDisconnected,
}

impl core::fmt::Display for SyncError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConnectionExhausted => write!(f, "connection attempts exhausted"),
            Self::SyncTimedOut => write!(f, "sync timed out"),
            Self::SyncAbortedDisconnected => write!(f, "link dropped during sync"),
        }
    }
}

impl core::error::Error for SyncError {}
