//! Compile-time configuration for the doorbell device
//!
//! Everything the operator cannot change from the serial menu lives here.

/// Settings store namespace holding all of this application's keys.
pub const SETTINGS_NAMESPACE: &str = "wifi-config";

/// GPIO number of the doorbell button (internal pull-down, active high).
pub const BUTTON_GPIO: u8 = 4;

/// Serial console baud rate.
pub const SERIAL_BAUD: u32 = 115_200;

/// How long the console waits for a line before giving up.
pub const LINE_TIMEOUT_MS: u64 = 30_000;

/// Maximum accepted console line length; extra bytes are discarded.
pub const MAX_LINE_LEN: usize = 256;

/// Interval between serial polls while waiting for a line.
pub const SERIAL_POLL_MS: u32 = 10;

/// Number of link polls after starting association.
pub const CONNECT_POLL_ATTEMPTS: u8 = 20;

/// Interval between link polls (20 x 500 ms = 10 s budget).
pub const CONNECT_POLL_INTERVAL_MS: u32 = 500;

/// Pause before the single retry of a failed webhook request.
pub const TRIGGER_RETRY_DELAY_MS: u32 = 50;

/// Hold time after a button-triggered request.
pub const DEBOUNCE_DELAY_MS: u32 = 100;

/// Idle delay between event loop iterations.
pub const IDLE_TICK_MS: u32 = 10;

/// Webhook response bodies longer than this are truncated in the console report.
pub const MAX_REPORTED_BODY: usize = 512;
