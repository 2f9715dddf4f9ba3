//! ESP32-S3 bindings for the doorbell-rs webhook button
//!
//! Everything in here talks to real peripherals: the UART0 console, the
//! esp-radio Wi-Fi station, the embassy-net TCP stack and the `nvs` flash
//! partition. The behaviour itself lives in `doorbell_core`; this crate only
//! supplies the [`doorbell_core::device::Platform`] implementation.

#![no_std]

extern crate alloc;

pub mod console;
pub mod http;
pub mod platform;
pub mod storage;
pub mod wifi;
