use alloc::string::String;
use core::ops::Range;

use embedded_storage_async::nor_flash::MultiwriteNorFlash;
use log::{trace, warn};
use sequential_storage::cache::NoCache;
use sequential_storage::map::{fetch_item, store_item};

use super::PreferencesBackend;
use crate::config::MAX_LINE_LEN;

/// Room for the largest stored value plus item overhead.
///
/// Console lines are capped at [`MAX_LINE_LEN`] raw bytes before lossy
/// decoding, and every invalid byte can grow into a 3-byte U+FFFD.
pub const ITEM_BUFFER_LEN: usize = 3 * MAX_LINE_LEN + 64;

pub type FlashError<E> = sequential_storage::Error<E>;

/// Preferences kept in a [`sequential_storage`] key/value map on NOR flash.
///
/// Keys are a 16-bit hash of `namespace/key`, values the raw UTF-8 bytes.
pub struct FlashMapBackend<F> {
    flash: F,
    range: Range<u32>,
    buffer: [u8; ITEM_BUFFER_LEN],
}

impl<F: MultiwriteNorFlash> FlashMapBackend<F> {
    pub fn new(flash: F, range: Range<u32>) -> Self {
        Self {
            flash,
            range,
            buffer: [0; ITEM_BUFFER_LEN],
        }
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    async fn store(&mut self, slot: u16, value: &str) -> Result<(), FlashError<F::Error>> {
        store_item(
            &mut self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &slot,
            &value.as_bytes(),
        )
        .await
    }
}

/// FNV-1a over `namespace/key`, xor-folded down to 16 bits.
pub fn slot_key(namespace: &str, key: &str) -> u16 {
    let mut hash: u32 = 0x811c_9dc5;
    let bytes = namespace
        .bytes()
        .chain(core::iter::once(b'/'))
        .chain(key.bytes());
    for byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    ((hash >> 16) ^ (hash & 0xffff)) as u16
}

impl<F: MultiwriteNorFlash> PreferencesBackend for FlashMapBackend<F> {
    type Error = FlashError<F::Error>;

    async fn read(&mut self, namespace: &str, key: &str) -> Result<Option<String>, Self::Error> {
        let slot = slot_key(namespace, key);
        let value = fetch_item::<u16, &[u8], _>(
            &mut self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &slot,
        )
        .await?;

        trace!("flash read {}/{} (slot {:#06x}): {}", namespace, key, slot, value.is_some());
        Ok(value.map(|bytes| String::from_utf8_lossy(bytes).into_owned()))
    }

    async fn write(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), Self::Error> {
        let slot = slot_key(namespace, key);
        trace!("flash write {}/{} (slot {:#06x})", namespace, key, slot);

        match self.store(slot, value).await {
            // Foreign data in the range (e.g. an old ESP-IDF NVS image)
            Err(sequential_storage::Error::Corrupted { .. }) => {
                warn!(
                    "settings flash {:#x}..{:#x} is not a settings map, erasing it",
                    self.range.start, self.range.end
                );
                sequential_storage::erase_all(&mut self.flash, self.range.clone()).await?;
                self.store(slot, value).await
            }
            result => result,
        }
    }
}
