//! The [`Platform`] binding that ties the firmware drivers together

use doorbell_core::device::Platform;
use doorbell_core::time::Clock;
use embassy_time::{Instant, Timer};
use embedded_hal_async::delay::DelayNs;
use esp_hal::gpio::Input;

use crate::console::UartConsole;
use crate::http::TcpHttpTransport;
use crate::storage::FlashPreferences;
use crate::wifi::EspRadio;

pub struct Esp32Platform;

impl Platform for Esp32Platform {
    type Button = Input<'static>;
    type Serial = UartConsole;
    type Radio = EspRadio;
    type Http = TcpHttpTransport;
    type Store = FlashPreferences;
    type Timer = EmbassyTimer;
}

/// Monotonic time and async delays backed by the embassy time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyTimer;

impl Clock for EmbassyTimer {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

impl DelayNs for EmbassyTimer {
    async fn delay_ns(&mut self, ns: u32) {
        Timer::after_nanos(u64::from(ns)).await;
    }

    async fn delay_us(&mut self, us: u32) {
        Timer::after_micros(u64::from(us)).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        Timer::after_millis(u64::from(ms)).await;
    }
}
