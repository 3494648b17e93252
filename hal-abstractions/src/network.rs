//! Radio link abstraction
//!
//! The link is driven asynchronously: `begin_connect` only initiates the
//! association, and callers poll `state()` until it settles. The policy of
//! how long to poll and how often to retry lives with the caller, not here.

/// Observable state of the wireless link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No association in progress.
    Disconnected,
    /// Association initiated, outcome not yet known.
    Connecting,
    /// Associated and usable.
    Connected,
    /// The driver reported a terminal failure for this attempt.
    Failed,
}

/// Contract a radio driver must satisfy.
pub trait NetworkLink {
    /// Start connecting to the named access point. Must not block; progress
    /// is observed through `state()`.
    fn begin_connect(&mut self, ssid: &str, credential: &str);

    /// Current link state.
    fn state(&self) -> LinkState;

    /// Tear the association down and power the radio off. Must not block.
    fn disconnect(&mut self);
}

impl<L: NetworkLink> NetworkLink for &mut L {
    fn begin_connect(&mut self, ssid: &str, credential: &str) {
        (**self).begin_connect(ssid, credential);
    }

    fn state(&self) -> LinkState {
        (**self).state()
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }
}
