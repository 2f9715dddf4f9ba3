//! Hardware doubles shared by the unit tests.
//!
//! Each double keeps its state behind an `Rc` so a test can hand one clone to
//! the code under test and inspect the other afterwards.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::net::Ipv4Addr;

use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;

use crate::console::SerialPort;
use crate::device::Platform;
use crate::storage::{MemoryBackend, PreferencesBackend};
use crate::time::Clock;
use crate::webhook::{HttpError, HttpResponse, HttpTransport};
use crate::wifi::{AccessPoint, Connectivity, WifiRadio};

const NANOS_PER_MILLI: u64 = 1_000_000;

pub struct TestPlatform;

impl Platform for TestPlatform {
    type Button = MockButton;
    type Serial = MockSerial;
    type Radio = MockRadio;
    type Http = MockHttp;
    type Store = MemoryBackend;
    type Timer = FakeTimer;
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Virtual clock that only moves when something delays on it.
#[derive(Clone, Default)]
pub struct FakeTimer {
    now_ns: Rc<Cell<u64>>,
}

impl FakeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now_ns.get() / NANOS_PER_MILLI
    }
}

impl Clock for FakeTimer {
    fn now_ms(&self) -> u64 {
        self.now()
    }
}

impl DelayNs for FakeTimer {
    async fn delay_ns(&mut self, ns: u32) {
        self.now_ns.set(self.now_ns.get() + u64::from(ns));
    }
}

// ---------------------------------------------------------------------------
// Serial
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SerialState {
    /// (available from ms, byte)
    input: VecDeque<(u64, u8)>,
    output: String,
}

#[derive(Clone, Default)]
pub struct MockSerial {
    state: Rc<RefCell<SerialState>>,
    clock: Option<FakeTimer>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// A port whose timed input follows `timer`.
    pub fn with_clock(timer: &FakeTimer) -> Self {
        Self {
            state: Rc::default(),
            clock: Some(timer.clone()),
        }
    }

    pub fn push_input(&mut self, text: &str) {
        self.push_input_at(0, text);
    }

    /// Queue `text` to arrive once the clock reaches `at_ms`.
    pub fn push_input_at(&mut self, at_ms: u64, text: &str) {
        self.state
            .borrow_mut()
            .input
            .extend(text.bytes().map(|b| (at_ms, b)));
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().input.len()
    }

    pub fn output(&self) -> String {
        self.state.borrow().output.clone()
    }

    pub fn clear_output(&mut self) {
        self.state.borrow_mut().output.clear();
    }

    fn now(&self) -> u64 {
        self.clock.as_ref().map_or(0, FakeTimer::now)
    }
}

impl core::fmt::Write for MockSerial {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.state.borrow_mut().output.push_str(s);
        Ok(())
    }
}

impl SerialPort for MockSerial {
    fn read_ready(&mut self) -> bool {
        let now = self.now();
        self.state
            .borrow()
            .input
            .front()
            .is_some_and(|&(at, _)| at <= now)
    }

    fn read_byte(&mut self) -> Option<u8> {
        if !self.read_ready() {
            return None;
        }
        self.state.borrow_mut().input.pop_front().map(|(_, b)| b)
    }
}

// ---------------------------------------------------------------------------
// Button
// ---------------------------------------------------------------------------

/// Replays a fixed sample sequence, then reads low forever.
pub struct MockButton {
    samples: VecDeque<bool>,
}

impl MockButton {
    pub fn new(samples: &[bool]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
        }
    }
}

impl ErrorType for MockButton {
    type Error = Infallible;
}

impl InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.samples.pop_front().unwrap_or(false))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

// ---------------------------------------------------------------------------
// Radio
// ---------------------------------------------------------------------------

struct AcceptedNetwork {
    ssid: String,
    password: String,
    polls_until_up: u32,
    ip: Ipv4Addr,
}

#[derive(Default)]
struct RadioState {
    networks: Vec<AccessPoint>,
    fail_scans: bool,
    accepted: Option<AcceptedNetwork>,
    /// (address, polls left before it is assigned)
    joining: Option<(Ipv4Addr, u32)>,
    connected: Option<Ipv4Addr>,
    begin_calls: usize,
    disconnect_calls: usize,
}

#[derive(Clone, Default)]
pub struct MockRadio {
    state: Rc<RefCell<RadioState>>,
}

impl MockRadio {
    pub fn with_networks(networks: &[(&str, i8)]) -> Self {
        let radio = Self::default();
        radio.state.borrow_mut().networks = networks
            .iter()
            .map(|&(ssid, rssi)| AccessPoint::new(ssid, rssi))
            .collect();
        radio
    }

    /// Let `ssid`/`password` associate, reporting `ip` on the link poll after
    /// `polls_until_up` unsuccessful ones.
    pub fn accept(&self, ssid: &str, password: &str, polls_until_up: u32, ip: Ipv4Addr) {
        self.state.borrow_mut().accepted = Some(AcceptedNetwork {
            ssid: String::from(ssid),
            password: String::from(password),
            polls_until_up,
            ip,
        });
    }

    pub fn force_connected(&self, ip: Ipv4Addr) {
        self.state.borrow_mut().connected = Some(ip);
    }

    pub fn fail_scans(&self) {
        self.state.borrow_mut().fail_scans = true;
    }

    pub fn begin_calls(&self) -> usize {
        self.state.borrow().begin_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        self.state.borrow().disconnect_calls
    }
}

impl WifiRadio for MockRadio {
    type Error = &'static str;

    async fn scan(&mut self) -> Result<Vec<AccessPoint>, &'static str> {
        let state = self.state.borrow();
        if state.fail_scans {
            Err("scan failed")
        } else {
            Ok(state.networks.clone())
        }
    }

    async fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.disconnect_calls += 1;
        state.connected = None;
        state.joining = None;
    }

    async fn begin(&mut self, ssid: &str, password: &str) -> Result<(), &'static str> {
        let mut state = self.state.borrow_mut();
        state.begin_calls += 1;
        let joining = state
            .accepted
            .as_ref()
            .filter(|net| net.ssid == ssid && net.password == password)
            .map(|net| (net.ip, net.polls_until_up));
        state.joining = joining;
        Ok(())
    }

    fn connectivity(&mut self) -> Connectivity {
        let mut state = self.state.borrow_mut();
        if let Some(ip) = state.connected {
            return Connectivity::Connected(ip);
        }
        let joining = state.joining;
        match joining {
            Some((ip, 0)) => {
                state.joining = None;
                state.connected = Some(ip);
                Connectivity::Connected(ip)
            }
            Some((ip, left)) => {
                state.joining = Some((ip, left - 1));
                Connectivity::Disconnected
            }
            None => Connectivity::Disconnected,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Default)]
struct HttpState {
    responses: VecDeque<Result<HttpResponse, HttpError>>,
    urls: Vec<String>,
}

/// Answers with queued results, then `200` with an empty body.
#[derive(Clone, Default)]
pub struct MockHttp {
    state: Rc<RefCell<HttpState>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, result: Result<HttpResponse, HttpError>) {
        self.state.borrow_mut().responses.push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.state.borrow().urls.len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.state.borrow().urls.clone()
    }
}

impl HttpTransport for MockHttp {
    async fn get(&mut self, url: &str) -> Result<HttpResponse, HttpError> {
        let mut state = self.state.borrow_mut();
        state.urls.push(String::from(url));
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "")))
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

pub struct FailingBackend;

impl PreferencesBackend for FailingBackend {
    type Error = &'static str;

    async fn read(&mut self, _namespace: &str, _key: &str) -> Result<Option<String>, &'static str> {
        Err("flash read failed")
    }

    async fn write(&mut self, _namespace: &str, _key: &str, _value: &str) -> Result<(), &'static str> {
        Err("flash write failed")
    }
}
