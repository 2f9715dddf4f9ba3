//! Menu actions
//!
//! One state, "awaiting choice", and four transitions. Every action runs to
//! completion (or aborts with a message) and control returns to the caller.

use alloc::string::String;

use log::{info, warn};

use super::{mask_password, or_not_set, parse_int, read_line, say};
use crate::config::LINE_TIMEOUT_MS;
use crate::device::{Doorbell, Platform};
use crate::webhook::is_trigger_url;
use crate::wifi::Connectivity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    TestTrigger,
    ConfigureWifi,
    SetTriggerUrl,
    ShowSettings,
    Invalid(i64),
}

impl MenuChoice {
    pub fn parse(line: &str) -> Self {
        match parse_int(line) {
            1 => Self::TestTrigger,
            2 => Self::ConfigureWifi,
            3 => Self::SetTriggerUrl,
            4 => Self::ShowSettings,
            other => Self::Invalid(other),
        }
    }
}

impl<P: Platform> Doorbell<P> {
    /// Print the menu, wait for one choice and act on it.
    ///
    /// Blocks for up to the line timeout; no input means no action.
    pub async fn run_console(&mut self) {
        self.print_menu();

        let line = self.read_console_line().await;
        if line.is_empty() {
            say!(self.serial, "No input received, returning to idle.");
            return;
        }

        self.handle_choice(MenuChoice::parse(&line)).await;
    }

    pub async fn handle_choice(&mut self, choice: MenuChoice) {
        info!("Console choice: {:?}", choice);
        match choice {
            MenuChoice::TestTrigger => {
                say!(self.serial, "Sending test trigger...");
                let _ = self.trigger_webhook().await;
            }
            MenuChoice::ConfigureWifi => self.configure_wifi().await,
            MenuChoice::SetTriggerUrl => self.set_trigger_url().await,
            MenuChoice::ShowSettings => self.show_settings(),
            MenuChoice::Invalid(_) => say!(self.serial, "Invalid choice. Please enter 1-4."),
        }
    }

    fn print_menu(&mut self) {
        say!(self.serial);
        say!(self.serial, "===== Doorbell Menu =====");
        say!(self.serial, "1. Send test trigger");
        say!(self.serial, "2. Configure Wi-Fi");
        say!(self.serial, "3. Set trigger URL");
        say!(self.serial, "4. Show current settings");
        say!(self.serial, "Enter choice (1-4):");
    }

    async fn read_console_line(&mut self) -> String {
        read_line(&mut self.serial, &mut self.timer, LINE_TIMEOUT_MS).await
    }

    /// Scan, let the operator pick a network and password, persist both,
    /// then try to connect.
    async fn configure_wifi(&mut self) {
        say!(self.serial, "Scanning for networks...");
        let results = self.network.scan_networks().await;
        if results.is_empty() {
            say!(self.serial, "No networks found.");
            return;
        }

        say!(self.serial, "Found {} networks:", results.len());
        for (i, ap) in results.iter().enumerate() {
            say!(self.serial, "  {}: {} ({} dBm)", i + 1, ap.ssid, ap.rssi);
        }
        say!(self.serial, "Select network (1-{}):", results.len());

        let line = self.read_console_line().await;
        let ssid = match results.select(&line) {
            Ok(ap) => ap.ssid.clone(),
            Err(_) => {
                say!(self.serial, "Invalid selection, Wi-Fi setup cancelled.");
                return;
            }
        };

        say!(self.serial, "Enter password for \"{}\":", ssid);
        let password = self.read_console_line().await;
        if password.is_empty() {
            say!(self.serial, "No password entered, Wi-Fi setup cancelled.");
            return;
        }

        if !self.store.save_credentials(&ssid, &password).await {
            warn!("Could not persist Wi-Fi credentials for \"{}\"", ssid);
            say!(self.serial, "Failed to save Wi-Fi settings.");
            return;
        }
        self.state.settings.ssid = ssid;
        self.state.settings.password = password;
        say!(self.serial, "Wi-Fi settings saved.");

        let _ = self.connect_wifi().await;
    }

    async fn set_trigger_url(&mut self) {
        say!(self.serial, "Enter trigger URL (http:// or https://):");

        let url = self.read_console_line().await;
        if url.is_empty() {
            say!(self.serial, "No URL entered, trigger URL unchanged.");
            return;
        }
        if !is_trigger_url(&url) {
            say!(self.serial, "URL must start with http:// or https://, trigger URL unchanged.");
            return;
        }

        if !self.store.save_trigger_url(&url).await {
            warn!("Could not persist trigger URL");
            say!(self.serial, "Failed to save trigger URL.");
            return;
        }
        say!(self.serial, "Trigger URL saved: {}", url);
        self.state.settings.trigger_url = url;
    }

    /// Read-only dump of the active settings and live link state.
    pub fn show_settings(&mut self) {
        let status = self.network.status();
        let settings = &self.state.settings;

        say!(self.serial, "--- Current settings ---");
        say!(self.serial, "SSID: {}", or_not_set(&settings.ssid));
        say!(self.serial, "Password: {}", mask_password(&settings.password));
        match status {
            Connectivity::Connected(ip) => say!(self.serial, "Wi-Fi: Connected (IP: {})", ip),
            Connectivity::Disconnected => say!(self.serial, "Wi-Fi: Disconnected"),
        }
        say!(self.serial, "Trigger URL: {}", or_not_set(&settings.trigger_url));
    }
}
