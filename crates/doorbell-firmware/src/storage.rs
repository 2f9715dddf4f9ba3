//! Settings persistence on the `nvs` flash partition

use core::ops::Range;

use doorbell_core::storage::FlashMapBackend;
use embassy_embedded_hal::adapter::BlockingAsync;
use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;

/// Offset and size of the `nvs` partition in the default partition table.
const SETTINGS_FLASH_RANGE: Range<u32> = 0x9000..0xF000;

pub type FlashPreferences = FlashMapBackend<BlockingAsync<FlashStorage<'static>>>;

pub fn flash_preferences(flash: FLASH<'static>) -> FlashPreferences {
    FlashMapBackend::new(
        BlockingAsync::new(FlashStorage::new(flash)),
        SETTINGS_FLASH_RANGE,
    )
}
