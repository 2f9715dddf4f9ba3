//! Hardware-independent core library for doorbell-rs
//!
//! This crate contains all platform-agnostic logic for the doorbell webhook
//! button: the persisted settings store, Wi-Fi connection management, the
//! webhook trigger client, the serial operator console and the event loop that
//! ties them together.
//!
//! Every hardware service is reached through a small trait (see [`device::Platform`]),
//! so the same code runs on the ESP32-S3 firmware, in the desktop simulator and
//! under host unit tests.

#![no_std]

extern crate alloc;

pub mod app_state;
pub mod button;
pub mod config;
pub mod console;
pub mod device;
pub mod storage;
pub mod time;
pub mod webhook;
pub mod wifi;

#[cfg(test)]
pub(crate) mod testing;
