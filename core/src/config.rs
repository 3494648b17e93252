//! Configuration surface
//!
//! Read once at startup, immutable thereafter. Defaults mirror the shipped
//! template settings; deployments override the fields they care about.

use embassy_time::Duration;

use crate::tz::{TzError, TzRule};

/// Protocol limit on the configured server list.
pub const MAX_SERVERS: usize = 3;

/// Access point credentials.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkConfig {
    pub ssid: &'static str,
    pub credential: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: "your-network",
            credential: "your-password",
        }
    }
}

/// Connection acquisition policy.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionPolicy {
    /// Attempts before the whole acquisition is abandoned.
    pub max_attempts: u32,
    /// Budget for a single attempt; each attempt gets a fresh window.
    pub attempt_timeout: Duration,
    /// How often the link state is polled while waiting.
    pub poll_interval: Duration,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_millis(30_000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Synchronization policy.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncPolicy {
    /// Time servers to try, in order (1 to `MAX_SERVERS`).
    pub servers: &'static [&'static str],
    /// POSIX timezone rule applied for civil-time display,
    /// e.g. `EST5EDT,M3.2.0,M11.1.0`.
    pub offset_rule: &'static str,
    /// Hours between scheduled sync attempts.
    pub resync_interval_hours: u32,
    /// Budget for one exchange, independent of the connection policy.
    pub exchange_timeout: Duration,
    /// How often the completion flag is polled while waiting.
    pub poll_interval: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            servers: &["pool.ntp.org", "time.nist.gov"],
            offset_rule: "EST5EDT,M3.2.0,M11.1.0",
            resync_interval_hours: 24,
            // 40 polls of 100 ms
            exchange_timeout: Duration::from_millis(4_000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Debug console settings. `baud_rate` is consumed by the board when it
/// opens the port; the core only honors `enabled`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub baud_rate: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            baud_rate: 115_200,
        }
    }
}

/// Aggregate of everything the firmware reads at startup.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub network: NetworkConfig,
    pub connection: ConnectionPolicy,
    pub sync: SyncPolicy,
    pub console: ConsoleConfig,
}

/// Startup validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The server list is empty.
    NoServers,
    /// More servers than `MAX_SERVERS`.
    TooManyServers,
    /// The offset rule did not parse.
    OffsetRule(TzError),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoServers => write!(f, "no time servers configured"),
            Self::TooManyServers => write!(f, "more than {} time servers configured", MAX_SERVERS),
            Self::OffsetRule(e) => write!(f, "invalid offset rule: {}", e),
        }
    }
}

impl core::error::Error for ConfigError {}

impl Settings {
    /// Check the startup invariants and parse the offset rule.
    pub fn validate(&self) -> Result<TzRule<'static>, ConfigError> {
        if self.sync.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        if self.sync.servers.len() > MAX_SERVERS {
            return Err(ConfigError::TooManyServers);
        }
        TzRule::parse(self.sync.offset_rule).map_err(ConfigError::OffsetRule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = Settings::default();
        let rule = settings.validate().expect("default settings are valid");
        assert_eq!(rule.std_abbr, "EST");
    }

    #[test]
    fn empty_server_list_is_rejected() {
        let mut settings = Settings::default();
        settings.sync.servers = &[];
        assert_eq!(settings.validate().unwrap_err(), ConfigError::NoServers);
    }

    #[test]
    fn oversized_server_list_is_rejected() {
        let mut settings = Settings::default();
        settings.sync.servers = &["a", "b", "c", "d"];
        assert_eq!(settings.validate().unwrap_err(), ConfigError::TooManyServers);
    }

    #[test]
    fn bad_offset_rule_is_rejected() {
        let mut settings = Settings::default();
        settings.sync.offset_rule = "not a rule";
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::OffsetRule(_))
        ));
    }
}
