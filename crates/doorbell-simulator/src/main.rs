//! Desktop simulator for the doorbell-rs webhook button.
//!
//! Runs the `doorbell-core` event loop on a desktop. The terminal stands in
//! for the serial console, a few fake access points stand in for the radio,
//! and trigger URLs are fetched for real.
//!
//! # Console input
//!
//! | Input     | Action                                 |
//! |-----------|----------------------------------------|
//! | `!`       | Press the doorbell button              |
//! | `1`..`4`  | Menu choice, while the menu is waiting |
//! | any line  | Forwarded to the console unchanged     |
//!
//! Settings persist in `doorbell-settings.bin`, or in the file named by the
//! first argument.

use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write as _};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use embassy_futures::block_on;
use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use doorbell_core::console::SerialPort;
use doorbell_core::device::{Board, Doorbell, Platform};
use doorbell_core::storage::{MemoryBackend, PreferencesBackend};
use doorbell_core::time::Clock;
use doorbell_core::webhook::{HttpError, HttpResponse, HttpTransport};
use doorbell_core::wifi::{AccessPoint, Connectivity, WifiRadio};

// ---------------------------------------------------------------------------
// Simulator constants
// ---------------------------------------------------------------------------

/// Default settings file, relative to the working directory.
const DEFAULT_SETTINGS_FILE: &str = "doorbell-settings.bin";

/// A stdin line consisting of just this presses the button.
const BUTTON_COMMAND: &str = "!";

/// Time from association to an assigned address.
const DHCP_DELAY: Duration = Duration::from_millis(1500);

/// WPA2 passphrases are at least this long.
const MIN_PASSPHRASE_LEN: usize = 8;

/// Address handed out by the simulated DHCP server.
const SIM_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

struct SimNetwork {
    ssid: &'static str,
    rssi: i8,
    open: bool,
}

const NETWORKS: &[SimNetwork] = &[
    SimNetwork {
        ssid: "HomeNet",
        rssi: -48,
        open: false,
    },
    SimNetwork {
        ssid: "CoffeeShop",
        rssi: -67,
        open: true,
    },
    SimNetwork {
        ssid: "Neighbour-5G",
        rssi: -81,
        open: false,
    },
];

// ---------------------------------------------------------------------------
// Serial console over stdin/stdout
// ---------------------------------------------------------------------------

struct SimSerial {
    input: Receiver<u8>,
    pending: Option<u8>,
}

impl SimSerial {
    fn new(input: Receiver<u8>) -> Self {
        Self {
            input,
            pending: None,
        }
    }
}

impl SerialPort for SimSerial {
    fn read_ready(&mut self) -> bool {
        if self.pending.is_none() {
            self.pending = self.input.try_recv().ok();
        }
        self.pending.is_some()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.pending.take().or_else(|| self.input.try_recv().ok())
    }
}

impl fmt::Write for SimSerial {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut stdout = io::stdout().lock();
        stdout.write_all(s.as_bytes()).map_err(|_| fmt::Error)?;
        stdout.flush().map_err(|_| fmt::Error)
    }
}

/// Forward stdin to the console byte channel, diverting button presses.
fn spawn_stdin_reader(bytes: Sender<u8>, button: Arc<AtomicBool>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };

            if line.trim() == BUTTON_COMMAND {
                debug!("button press from stdin");
                button.store(true, Ordering::SeqCst);
                continue;
            }

            for byte in line.bytes().chain(std::iter::once(b'\n')) {
                if bytes.send(byte).is_err() {
                    return;
                }
            }
        }
        info!("stdin closed");
    });
}

// ---------------------------------------------------------------------------
// Button and clock
// ---------------------------------------------------------------------------

/// Reads high exactly once per press, then low again.
struct SimButton {
    pressed: Arc<AtomicBool>,
}

impl ErrorType for SimButton {
    type Error = Infallible;
}

impl InputPin for SimButton {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.pressed.swap(false, Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

struct SimClock {
    start: Instant,
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl DelayNs for SimClock {
    async fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

// ---------------------------------------------------------------------------
// Simulated radio
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SimRadio {
    /// When the current association started, if it will succeed.
    joined_at: Option<Instant>,
}

fn accepts(ssid: &str, password: &str) -> bool {
    NETWORKS
        .iter()
        .find(|network| network.ssid == ssid)
        .is_some_and(|network| network.open || password.len() >= MIN_PASSPHRASE_LEN)
}

impl WifiRadio for SimRadio {
    type Error = Infallible;

    async fn scan(&mut self) -> Result<Vec<AccessPoint>, Infallible> {
        thread::sleep(Duration::from_millis(300));
        Ok(NETWORKS
            .iter()
            .map(|network| AccessPoint::new(network.ssid, network.rssi))
            .collect())
    }

    async fn disconnect(&mut self) {
        self.joined_at = None;
    }

    async fn begin(&mut self, ssid: &str, password: &str) -> Result<(), Infallible> {
        let accepted = accepts(ssid, password);
        debug!("simulated join '{}': {}", ssid, if accepted { "accepted" } else { "rejected" });
        self.joined_at = accepted.then(Instant::now);
        Ok(())
    }

    fn connectivity(&mut self) -> Connectivity {
        match self.joined_at {
            Some(at) if at.elapsed() >= DHCP_DELAY => Connectivity::Connected(SIM_ADDRESS),
            _ => Connectivity::Disconnected,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent("doorbell-rs")
            .build()?;
        Ok(Self { client })
    }
}

/// Whether a failed lookup is anywhere in the error's source chain.
///
/// reqwest reports resolver failures as connect errors; only the wrapped
/// connector error says "dns error".
fn is_dns_failure(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let message = err.to_string();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        current = err.source();
    }
    false
}

fn classify(error: &reqwest::Error) -> HttpError {
    if error.is_builder() {
        HttpError::InvalidUrl
    } else if error.is_timeout() {
        HttpError::ReadTimeout
    } else if is_dns_failure(error) {
        HttpError::DnsFailed
    } else if error.is_connect() {
        HttpError::ConnectionRefused
    } else if error.is_request() {
        HttpError::SendFailed
    } else {
        HttpError::ConnectionLost
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&mut self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self.client.get(url).send().map_err(|e| {
            warn!("GET {} failed: {}", url, e);
            classify(&e)
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            warn!("reading response from {} failed: {}", url, e);
            classify(&e)
        })?;
        Ok(HttpResponse::new(status, &body))
    }
}

// ---------------------------------------------------------------------------
// File-backed settings store
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct StoredEntry {
    namespace: String,
    key: String,
    value: String,
}

/// [`MemoryBackend`] mirrored to a postcard file after every write.
struct FileBackend {
    path: PathBuf,
    entries: MemoryBackend,
}

impl FileBackend {
    fn open(path: PathBuf) -> Self {
        let mut entries = MemoryBackend::new();

        match fs::read(&path) {
            Ok(bytes) => match postcard::from_bytes::<Vec<StoredEntry>>(&bytes) {
                Ok(stored) => {
                    for entry in &stored {
                        entries.insert(&entry.namespace, &entry.key, &entry.value);
                    }
                    info!("loaded {} settings from {}", stored.len(), path.display());
                }
                Err(e) => warn!("ignoring unreadable {}: {}", path.display(), e),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no settings file at {}, starting empty", path.display());
            }
            Err(e) => warn!("cannot read {}: {}", path.display(), e),
        }

        Self { path, entries }
    }

    fn persist(&self) -> io::Result<()> {
        let stored: Vec<StoredEntry> = self
            .entries
            .entries()
            .map(|(namespace, key, value)| StoredEntry {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
                value: value.to_owned(),
            })
            .collect();

        let bytes = postcard::to_allocvec(&stored).map_err(io::Error::other)?;
        fs::write(&self.path, bytes)
    }
}

impl PreferencesBackend for FileBackend {
    type Error = io::Error;

    async fn read(&mut self, namespace: &str, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(namespace, key).map(str::to_owned))
    }

    async fn write(&mut self, namespace: &str, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(namespace, key, value);
        self.persist()
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

struct DesktopPlatform;

impl Platform for DesktopPlatform {
    type Button = SimButton;
    type Serial = SimSerial;
    type Radio = SimRadio;
    type Http = ReqwestTransport;
    type Store = FileBackend;
    type Timer = SimClock;
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));

    let http = match ReqwestTransport::new() {
        Ok(http) => http,
        Err(e) => {
            eprintln!("cannot create HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let (tx, rx) = mpsc::channel();
    let pressed = Arc::new(AtomicBool::new(false));
    spawn_stdin_reader(tx, Arc::clone(&pressed));

    info!("Type '{}' and Enter to press the doorbell button", BUTTON_COMMAND);

    let mut doorbell = Doorbell::<DesktopPlatform>::new(Board {
        button: SimButton { pressed },
        serial: SimSerial::new(rx),
        radio: SimRadio::default(),
        http,
        store: FileBackend::open(settings_path),
        timer: SimClock {
            start: Instant::now(),
        },
    });

    block_on(async {
        doorbell.startup().await;
        doorbell.run().await
    })
}
