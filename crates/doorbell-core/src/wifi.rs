//! Network connectivity manager
//!
//! Station-mode Wi-Fi on top of a [`WifiRadio`]: on-demand network scans,
//! connect with a bounded status poll, and live connectivity reporting.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::config::{CONNECT_POLL_ATTEMPTS, CONNECT_POLL_INTERVAL_MS};
use crate::console::parse_int;

/// One network found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub ssid: String,
    /// Signal strength in dBm
    pub rssi: i8,
}

impl AccessPoint {
    pub fn new(ssid: &str, rssi: i8) -> Self {
        Self {
            ssid: String::from(ssid),
            rssi,
        }
    }
}

/// Live station state. Connected means associated *and* addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Disconnected,
    Connected(Ipv4Addr),
}

impl Connectivity {
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// Station-mode radio driver.
pub trait WifiRadio {
    type Error: Debug;

    /// Blocking scan; an empty vector when nothing is in range.
    fn scan(&mut self) -> impl Future<Output = Result<Vec<AccessPoint>, Self::Error>>;

    /// Drop any current association. A no-op when not associated.
    fn disconnect(&mut self) -> impl Future<Output = ()>;

    /// Start associating with `ssid`. Returns once the attempt is under way;
    /// progress is observed through [`WifiRadio::connectivity`].
    fn begin(&mut self, ssid: &str, password: &str)
    -> impl Future<Output = Result<(), Self::Error>>;

    fn connectivity(&mut self) -> Connectivity;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    #[error("no SSID configured")]
    MissingSsid,
    #[error("radio refused to start the connection")]
    Radio,
    #[error("no connection after {0} attempts")]
    Timeout(u8),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid selection")]
    Invalid,
}

/// Ordered scan results, discarded once the operator has picked one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanResults {
    networks: Vec<AccessPoint>,
}

impl ScanResults {
    pub fn new(networks: Vec<AccessPoint>) -> Self {
        Self { networks }
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessPoint> {
        self.networks.iter()
    }

    /// Resolve an operator's 1-based pick.
    ///
    /// Input is parsed like the menu choices, so anything non-numeric reads
    /// as 0 and is rejected together with out-of-range numbers.
    pub fn select(&self, input: &str) -> Result<&AccessPoint, SelectionError> {
        let choice = parse_int(input);
        if choice < 1 {
            return Err(SelectionError::Invalid);
        }
        usize::try_from(choice - 1)
            .ok()
            .and_then(|index| self.networks.get(index))
            .ok_or(SelectionError::Invalid)
    }
}

pub struct NetworkManager<R: WifiRadio> {
    radio: R,
}

impl<R: WifiRadio> NetworkManager<R> {
    pub fn new(radio: R) -> Self {
        Self { radio }
    }

    /// Scan for networks. Radio errors are logged and read as "none found".
    pub async fn scan_networks(&mut self) -> ScanResults {
        match self.radio.scan().await {
            Ok(networks) => {
                info!("Scan found {} networks", networks.len());
                ScanResults::new(networks)
            }
            Err(e) => {
                warn!("Wi-Fi scan failed: {:?}", e);
                ScanResults::default()
            }
        }
    }

    /// Connect to `ssid`, polling the link every 500 ms up to 20 times.
    ///
    /// Any existing association is dropped first. Failure leaves the station
    /// disconnected; nothing retries automatically.
    pub async fn connect<D: DelayNs>(
        &mut self,
        ssid: &str,
        password: &str,
        delay: &mut D,
    ) -> Result<Ipv4Addr, ConnectError> {
        if ssid.is_empty() {
            return Err(ConnectError::MissingSsid);
        }

        info!("Connecting to Wi-Fi SSID=\"{}\"", ssid);
        self.radio.disconnect().await;
        self.radio.begin(ssid, password).await.map_err(|e| {
            warn!("Wi-Fi begin failed: {:?}", e);
            ConnectError::Radio
        })?;

        for attempt in 1..=CONNECT_POLL_ATTEMPTS {
            if let Connectivity::Connected(ip) = self.radio.connectivity() {
                info!("Wi-Fi connected after {} polls: ip={}", attempt - 1, ip);
                return Ok(ip);
            }
            debug!("Waiting for Wi-Fi ({}/{})", attempt, CONNECT_POLL_ATTEMPTS);
            delay.delay_ms(CONNECT_POLL_INTERVAL_MS).await;
        }

        match self.radio.connectivity() {
            Connectivity::Connected(ip) => Ok(ip),
            Connectivity::Disconnected => {
                warn!("Wi-Fi connection to \"{}\" timed out", ssid);
                Err(ConnectError::Timeout(CONNECT_POLL_ATTEMPTS))
            }
        }
    }

    pub fn status(&mut self) -> Connectivity {
        self.radio.connectivity()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }
}
