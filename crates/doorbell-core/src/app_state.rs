//! Application-wide state for the doorbell device

use alloc::string::String;

use crate::button::EdgeDetector;

/// The active settings record.
///
/// Loaded once from the settings store at startup. Only the Wi-Fi and
/// trigger-URL menu actions mutate it, and always right after the matching
/// store write succeeded. Missing fields are empty strings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    pub ssid: String,
    pub password: String,
    pub trigger_url: String,
}

impl Settings {
    pub fn has_wifi(&self) -> bool {
        !self.ssid.is_empty()
    }
}

/// Main application state container
///
/// Owned by the event loop and passed around explicitly; nothing here is a
/// global.
#[derive(Debug, Default)]
pub struct AppState {
    pub settings: Settings,
    pub button: EdgeDetector,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
