//! SNTP time source
//!
//! The scheduler needs `begin_sync` to return immediately, so the source
//! is split in two: [`SntpHandle`] implements the `TimeSource` contract by
//! posting a request into shared [`SntpState`], and [`SntpRunner`] is a
//! long-lived task that picks requests up, walks the server list over UDP,
//! and publishes the result. Completion is reported by raising the signal
//! the runner was wired to at construction, and only on success; a failed
//! pass leaves the scheduler to its exchange timeout.

use core::cell::Cell;

use embassy_futures::select::{select, Either};
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use hal_abstractions::{SyncSignal, TimeSource, Timestamp};

/// On-wire SNTP packet length.
const PACKET_LEN: usize = 48;

/// SNTP exchange tuning.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SntpConfig {
    /// Server UDP port.
    pub port: u16,
    /// Budget for one request/response round trip.
    pub request_timeout: Duration,
    /// Attempts per server before moving to the next one.
    pub retries_per_server: u8,
    /// Pause between retries against the same server.
    pub retry_backoff: Duration,
    /// Maximum accepted stratum level (1-15).
    pub max_stratum: u8,
}

impl Default for SntpConfig {
    fn default() -> Self {
        Self {
            port: 123,
            request_timeout: Duration::from_millis(1_000),
            retries_per_server: 2,
            retry_backoff: Duration::from_millis(200),
            max_stratum: 3,
        }
    }
}

/// SNTP failure causes, per request and per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SntpError {
    /// Name resolution failed or returned no addresses.
    Dns,
    /// The UDP socket could not be bound or used.
    Socket,
    /// No response within the request timeout.
    Timeout,
    /// Response shorter than an SNTP packet.
    ShortResponse,
    /// Response arrived from an address other than the queried server.
    WrongSender,
    /// Stratum zero (kiss-of-death) or above the configured maximum.
    BadStratum(u8),
    /// Every configured server was exhausted.
    AllServersFailed,
}

impl core::fmt::Display for SntpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Dns => write!(f, "DNS resolution failed"),
            Self::Socket => write!(f, "UDP socket error"),
            Self::Timeout => write!(f, "request timed out"),
            Self::ShortResponse => write!(f, "short response"),
            Self::WrongSender => write!(f, "response from unexpected sender"),
            Self::BadStratum(s) => write!(f, "unacceptable stratum {}", s),
            Self::AllServersFailed => write!(f, "all servers failed"),
        }
    }
}

impl core::error::Error for SntpError {}

struct Request {
    servers: &'static [&'static str],
}

/// State shared between the scheduler-side handle and the runner task.
/// Lives in a `static`.
pub struct SntpState {
    request: Signal<CriticalSectionRawMutex, Request>,
    current: Mutex<CriticalSectionRawMutex, Cell<Option<Timestamp>>>,
    offset_rule: Mutex<CriticalSectionRawMutex, Cell<&'static str>>,
}

impl SntpState {
    pub const fn new() -> Self {
        Self {
            request: Signal::new(),
            current: Mutex::new(Cell::new(None)),
            offset_rule: Mutex::new(Cell::new("")),
        }
    }

    /// The civil-time offset rule from the most recent `begin_sync`, for
    /// board-side diagnostics. Empty before the first request.
    pub fn offset_rule(&self) -> &'static str {
        self.offset_rule.lock(|c| c.get())
    }
}

impl Default for SntpState {
    fn default() -> Self {
        Self::new()
    }
}

/// Scheduler-facing half of the SNTP source.
pub struct SntpHandle {
    state: &'static SntpState,
}

impl SntpHandle {
    pub fn new(state: &'static SntpState) -> Self {
        Self { state }
    }
}

impl TimeSource for SntpHandle {
    fn begin_sync(&mut self, servers: &'static [&'static str], offset_rule: &'static str) {
        self.state.offset_rule.lock(|c| c.set(offset_rule));
        // A newer request overwrites an unserviced older one.
        self.state.request.signal(Request { servers });
    }

    fn now(&self) -> Option<Timestamp> {
        self.state.current.lock(|c| c.get())
    }
}

/// Socket-owning half of the SNTP source. Spawn `run` on the executor
/// next to the network stack's own task.
pub struct SntpRunner {
    stack: Stack<'static>,
    state: &'static SntpState,
    done: &'static SyncSignal,
    config: SntpConfig,
}

impl SntpRunner {
    pub fn new(
        stack: Stack<'static>,
        state: &'static SntpState,
        done: &'static SyncSignal,
        config: SntpConfig,
    ) -> Self {
        Self {
            stack,
            state,
            done,
            config,
        }
    }

    /// Service sync requests forever.
    pub async fn run(self) -> ! {
        loop {
            let request = self.state.request.wait().await;
            match self.exchange(request.servers).await {
                Ok(timestamp) => {
                    self.state.current.lock(|c| c.set(Some(timestamp)));
                    info!(
                        "sntp: clock set, unix={} micros={}",
                        timestamp.unix_secs, timestamp.micros
                    );
                    self.done.raise();
                }
                Err(e) => {
                    error!("sntp: pass failed: {:?}", e);
                }
            }
        }
    }

    /// One pass over the server list.
    async fn exchange(&self, servers: &'static [&'static str]) -> Result<Timestamp, SntpError> {
        for server in servers {
            for attempt in 1..=self.config.retries_per_server {
                debug!("sntp: querying {} (attempt {})", server, attempt);
                match self.request(server).await {
                    Ok(timestamp) => return Ok(timestamp),
                    Err(e) => {
                        warn!("sntp: {} failed: {:?}", server, e);
                        Timer::after(self.config.retry_backoff).await;
                    }
                }
            }
        }
        Err(SntpError::AllServersFailed)
    }

    async fn request(&self, server: &str) -> Result<Timestamp, SntpError> {
        let server_ip = self
            .stack
            .dns_query(server, DnsQueryType::A)
            .await
            .map_err(|_| SntpError::Dns)?
            .first()
            .copied()
            .ok_or(SntpError::Dns)?;
        let endpoint = IpEndpoint::new(server_ip, self.config.port);

        let mut rx_meta = [PacketMetadata::EMPTY; 2];
        let mut rx_buffer = [0u8; 64];
        let mut tx_meta = [PacketMetadata::EMPTY; 2];
        let mut tx_buffer = [0u8; 64];
        let mut socket = UdpSocket::new(
            self.stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );
        socket.bind(0).map_err(|_| SntpError::Socket)?;

        let packet = client_request();
        let sent_at = Instant::now();
        socket
            .send_to(&packet, endpoint)
            .await
            .map_err(|_| SntpError::Socket)?;

        let mut response = [0u8; PACKET_LEN];
        let timeout = Timer::after(self.config.request_timeout);
        let (len, from) = match select(timeout, socket.recv_from(&mut response)).await {
            Either::First(_) => return Err(SntpError::Timeout),
            Either::Second(result) => result.map_err(|_| SntpError::Socket)?,
        };
        let rtt = Instant::now().duration_since(sent_at);

        if from.endpoint.addr != server_ip {
            return Err(SntpError::WrongSender);
        }
        let transmit = parse_transmit_timestamp(&response[..len], self.config.max_stratum)?;
        Ok(apply_rtt_correction(transmit, rtt))
    }
}

/// Client request packet: LI=0, VN=3, Mode=3.
fn client_request() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = 0x1B;
    packet
}

/// Validate a response and pull out its transmit timestamp.
fn parse_transmit_timestamp(response: &[u8], max_stratum: u8) -> Result<Timestamp, SntpError> {
    if response.len() < PACKET_LEN {
        return Err(SntpError::ShortResponse);
    }
    let stratum = response[1];
    if stratum == 0 || stratum > max_stratum {
        return Err(SntpError::BadStratum(stratum));
    }
    let secs =
        u32::from_be_bytes([response[40], response[41], response[42], response[43]]) as u64;
    let frac = u32::from_be_bytes([response[44], response[45], response[46], response[47]]);
    Ok(Timestamp::from_ntp(secs, frac))
}

/// Shift the server's transmit time forward by half the round trip,
/// clamped to one second. The clamp keeps `micros` in range no matter how
/// large the configured request timeout lets the round trip grow.
fn apply_rtt_correction(mut timestamp: Timestamp, rtt: Duration) -> Timestamp {
    let correction = (rtt.as_micros() / 2).min(1_000_000) as u32;
    timestamp.micros = timestamp.micros.saturating_add(correction);
    if timestamp.micros >= 1_000_000 {
        timestamp.unix_secs = timestamp.unix_secs.saturating_add(1);
        timestamp.micros -= 1_000_000;
    }
    timestamp
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-01-15 12:00:00 UTC in the NTP epoch.
    const NTP_SECS: u32 = 3_977_467_200;
    const UNIX_SECS: u64 = 1_768_478_400;

    fn response(stratum: u8, secs: u32, frac: u32) -> [u8; PACKET_LEN] {
        let mut packet = [0u8; PACKET_LEN];
        packet[0] = 0x1C; // LI=0, VN=3, Mode=4 (server)
        packet[1] = stratum;
        packet[40..44].copy_from_slice(&secs.to_be_bytes());
        packet[44..48].copy_from_slice(&frac.to_be_bytes());
        packet
    }

    #[test]
    fn request_packet_is_a_version_3_client_query() {
        let packet = client_request();
        assert_eq!(packet[0], 0x1B);
        assert!(packet[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn transmit_timestamp_is_extracted() {
        let packet = response(2, NTP_SECS, 0x8000_0000);
        let ts = parse_transmit_timestamp(&packet, 3).unwrap();
        assert_eq!(ts.unix_secs, UNIX_SECS);
        assert_eq!(ts.micros, 500_000);
    }

    #[test]
    fn short_responses_are_rejected() {
        let packet = response(2, NTP_SECS, 0);
        assert_eq!(
            parse_transmit_timestamp(&packet[..40], 3),
            Err(SntpError::ShortResponse)
        );
    }

    #[test]
    fn kiss_of_death_and_high_strata_are_rejected() {
        let packet = response(0, NTP_SECS, 0);
        assert_eq!(
            parse_transmit_timestamp(&packet, 3),
            Err(SntpError::BadStratum(0))
        );
        let packet = response(4, NTP_SECS, 0);
        assert_eq!(
            parse_transmit_timestamp(&packet, 3),
            Err(SntpError::BadStratum(4))
        );
    }

    #[test]
    fn rtt_correction_advances_by_half_the_round_trip() {
        let ts = Timestamp::new(UNIX_SECS, 100_000);
        let corrected = apply_rtt_correction(ts, Duration::from_micros(3_000));
        assert_eq!(corrected.unix_secs, UNIX_SECS);
        assert_eq!(corrected.micros, 101_500);
    }

    #[test]
    fn rtt_correction_clamps_at_one_second() {
        // A 5 s round trip: the correction caps at 1 s and `micros` stays
        // inside 0..1_000_000.
        let corrected = apply_rtt_correction(Timestamp::new(UNIX_SECS, 0), Duration::from_secs(5));
        assert_eq!(corrected.unix_secs, UNIX_SECS + 1);
        assert_eq!(corrected.micros, 0);

        let corrected =
            apply_rtt_correction(Timestamp::new(UNIX_SECS, 999_999), Duration::from_secs(5));
        assert_eq!(corrected.unix_secs, UNIX_SECS + 1);
        assert_eq!(corrected.micros, 999_999);
    }

    #[test]
    fn rtt_correction_carries_into_seconds() {
        let ts = Timestamp::new(UNIX_SECS, 999_900);
        let corrected = apply_rtt_correction(ts, Duration::from_micros(400));
        assert_eq!(corrected.unix_secs, UNIX_SECS + 1);
        assert_eq!(corrected.micros, 100);
    }

    #[test]
    fn handle_posts_requests_and_reads_back_state() {
        static STATE: SntpState = SntpState::new();
        static SERVERS: [&str; 1] = ["pool.ntp.org"];

        let mut handle = SntpHandle::new(&STATE);
        assert_eq!(handle.now(), None);

        handle.begin_sync(&SERVERS, "EST5EDT,M3.2.0,M11.1.0");
        assert_eq!(STATE.offset_rule(), "EST5EDT,M3.2.0,M11.1.0");
        let request = STATE.request.try_take().expect("request posted");
        assert_eq!(request.servers.len(), 1);

        STATE.current.lock(|c| c.set(Some(Timestamp::new(UNIX_SECS, 0))));
        assert_eq!(handle.now(), Some(Timestamp::new(UNIX_SECS, 0)));
    }
}
