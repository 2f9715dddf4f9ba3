#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use doorbell_core::config::SERIAL_BAUD;
use doorbell_core::device::{Board, Doorbell};
use doorbell_firmware::console::UartConsole;
use doorbell_firmware::http::TcpHttpTransport;
use doorbell_firmware::platform::{EmbassyTimer, Esp32Platform};
use doorbell_firmware::storage::flash_preferences;
use doorbell_firmware::wifi;
use embassy_executor::Spawner;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart};
use log::{LevelFilter, info};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!(LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    // Operator console on the USB-UART bridge
    let uart = Uart::new(
        peripherals.UART0,
        UartConfig::default().with_baudrate(SERIAL_BAUD),
    )
    .expect("Failed to initialize UART0")
    .with_tx(peripherals.GPIO43)
    .with_rx(peripherals.GPIO44);

    // Doorbell button, active high
    let button = Input::new(
        peripherals.GPIO4,
        InputConfig::default().with_pull(Pull::Down),
    );

    let radio = wifi::init(&spawner, peripherals.WIFI).expect("Failed to initialize Wi-Fi");
    let http = TcpHttpTransport::new(radio.stack());

    let mut doorbell = Doorbell::<Esp32Platform>::new(Board {
        button,
        serial: UartConsole::new(uart),
        radio,
        http,
        store: flash_preferences(peripherals.FLASH),
        timer: EmbassyTimer,
    });

    doorbell.startup().await;
    doorbell.run().await
}
