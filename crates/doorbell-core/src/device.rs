//! The doorbell event loop
//!
//! [`Doorbell`] owns every hardware service and the application state. A
//! single thread of control runs it: each [`Doorbell::tick`] samples the
//! button, fires the webhook on a rising edge, and hands the serial port to
//! the console when input is waiting. Every step blocks until it is done.

use core::net::Ipv4Addr;

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use log::{info, warn};

use crate::app_state::{AppState, Settings};
use crate::config::{DEBOUNCE_DELAY_MS, IDLE_TICK_MS, MAX_REPORTED_BODY};
use crate::console::{SerialPort, say};
use crate::storage::{PreferencesBackend, SettingsStore};
use crate::time::Clock;
use crate::webhook::{HttpResponse, HttpTransport, TriggerError, WebhookClient};
use crate::wifi::{ConnectError, NetworkManager, WifiRadio};

/// The set of hardware services a target provides.
pub trait Platform {
    type Button: InputPin;
    type Serial: SerialPort;
    type Radio: WifiRadio;
    type Http: HttpTransport;
    type Store: PreferencesBackend;
    type Timer: Clock + DelayNs;
}

/// Initialized hardware, handed to [`Doorbell::new`].
pub struct Board<P: Platform> {
    pub button: P::Button,
    pub serial: P::Serial,
    pub radio: P::Radio,
    pub http: P::Http,
    pub store: P::Store,
    pub timer: P::Timer,
}

pub struct Doorbell<P: Platform> {
    pub(crate) button: P::Button,
    pub(crate) serial: P::Serial,
    pub(crate) timer: P::Timer,
    pub(crate) network: NetworkManager<P::Radio>,
    pub(crate) webhook: WebhookClient<P::Http>,
    pub(crate) store: SettingsStore<P::Store>,
    pub(crate) state: AppState,
}

impl<P: Platform> Doorbell<P> {
    pub fn new(board: Board<P>) -> Self {
        Self {
            button: board.button,
            serial: board.serial,
            timer: board.timer,
            network: NetworkManager::new(board.radio),
            webhook: WebhookClient::new(board.http),
            store: SettingsStore::new(board.store),
            state: AppState::new(),
        }
    }

    /// Load settings, bring up Wi-Fi if configured, then offer the menu once.
    pub async fn startup(&mut self) {
        info!("Doorbell starting");
        self.load_settings().await;

        say!(self.serial);
        say!(self.serial, "=== Doorbell webhook button ===");

        if self.state.settings.has_wifi() {
            let _ = self.connect_wifi().await;
        } else {
            info!("No Wi-Fi credentials stored");
            say!(self.serial, "No Wi-Fi configured. Choose option 2 to set it up.");
        }

        self.run_console().await;
    }

    pub async fn load_settings(&mut self) {
        self.state.settings = self.store.load().await;
        info!(
            "Settings loaded (ssid={:?}, trigger url set={})",
            self.state.settings.ssid,
            !self.state.settings.trigger_url.is_empty()
        );
    }

    /// One event loop iteration.
    pub async fn tick(&mut self) {
        let pressed = self.button.is_high().unwrap_or_else(|e| {
            warn!("Button read failed: {:?}", e);
            false
        });

        if self.state.button.update(pressed) {
            info!("Button pressed");
            say!(self.serial, "Button pressed!");
            let _ = self.trigger_webhook().await;
            self.timer.delay_ms(DEBOUNCE_DELAY_MS).await;
        }

        if self.serial.read_ready() {
            self.run_console().await;
        }
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.tick().await;
            self.timer.delay_ms(IDLE_TICK_MS).await;
        }
    }

    /// Fire the webhook for the active trigger URL and report the outcome.
    pub async fn trigger_webhook(&mut self) -> Result<HttpResponse, TriggerError> {
        let connectivity = self.network.status();
        let result = self
            .webhook
            .trigger(
                connectivity,
                &self.state.settings.trigger_url,
                &mut self.timer,
            )
            .await;

        match &result {
            Ok(response) => {
                say!(self.serial, "Webhook response code: {}", response.status);
                if !response.body.is_empty() {
                    let (body, truncated) = truncate_body(&response.body);
                    say!(
                        self.serial,
                        "Response: {}{}",
                        body,
                        if truncated { "... (truncated)" } else { "" }
                    );
                }
            }
            Err(TriggerError::NotConnected) => {
                warn!("Trigger skipped, Wi-Fi not connected");
                say!(self.serial, "Cannot trigger: Wi-Fi not connected.");
            }
            Err(TriggerError::EmptyUrl) => {
                warn!("Trigger skipped, no URL configured");
                say!(self.serial, "Cannot trigger: no trigger URL set (use option 3).");
            }
            Err(e) => {
                warn!("Webhook failed: {}", e);
                say!(self.serial, "Webhook {}", e);
            }
        }

        result
    }

    /// Connect with the active credentials and report the outcome.
    pub async fn connect_wifi(&mut self) -> Result<Ipv4Addr, ConnectError> {
        say!(self.serial, "Connecting to \"{}\"...", self.state.settings.ssid);

        let result = self
            .network
            .connect(
                &self.state.settings.ssid,
                &self.state.settings.password,
                &mut self.timer,
            )
            .await;

        match result {
            Ok(ip) => say!(self.serial, "Connected! IP address: {}", ip),
            Err(e) => say!(self.serial, "Wi-Fi connection failed: {}", e),
        }

        result
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn store(&self) -> &SettingsStore<P::Store> {
        &self.store
    }
}

/// Cut `body` to at most [`MAX_REPORTED_BODY`] bytes on a char boundary.
fn truncate_body(body: &str) -> (&str, bool) {
    if body.len() <= MAX_REPORTED_BODY {
        return (body, false);
    }
    let mut end = MAX_REPORTED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    (&body[..end], true)
}
