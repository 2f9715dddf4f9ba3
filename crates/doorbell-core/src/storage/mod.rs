//! Persistent settings store
//!
//! Settings live in a namespaced key-value store that survives power cycles.
//! Access is scoped: [`SettingsStore::open`] hands out a [`Preferences`]
//! session that borrows the backend for exactly one logical read or batch of
//! writes and releases it when dropped.

mod flash;
mod memory;

pub use flash::{FlashError, FlashMapBackend, ITEM_BUFFER_LEN, slot_key};
pub use memory::MemoryBackend;

use alloc::string::String;
use core::fmt::Debug;

use log::{error, trace};
use thiserror_no_std::Error;

use crate::app_state::Settings;
use crate::config::SETTINGS_NAMESPACE;

/// Keys stored under [`SETTINGS_NAMESPACE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsKey {
    Ssid,
    Password,
    TriggerUrl,
}

impl SettingsKey {
    pub const ALL: [SettingsKey; 3] = [Self::Ssid, Self::Password, Self::TriggerUrl];

    /// Key string as written to the backend
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ssid => "ssid",
            Self::Password => "password",
            Self::TriggerUrl => "trigger-url",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("preferences were opened read-only")]
    ReadOnly,
    #[error("storage backend failure")]
    Backend,
}

/// Raw key-value storage underneath the settings store.
///
/// Implementations need not handle concurrent access; the device has a single
/// thread of control and holds at most one session at a time.
pub trait PreferencesBackend {
    type Error: Debug;

    /// Read `key` in `namespace`, `None` if it was never written.
    fn read(
        &mut self,
        namespace: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>>;

    /// Write `value` under `key` in `namespace`, replacing any previous value.
    fn write(
        &mut self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), Self::Error>>;
}

/// An open preferences session.
///
/// Holds the backend borrow for its lifetime, so a second session cannot be
/// opened until this one is dropped.
pub struct Preferences<'a, B: PreferencesBackend> {
    backend: &'a mut B,
    namespace: &'static str,
    mode: OpenMode,
}

impl<B: PreferencesBackend> Preferences<'_, B> {
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Read `key`, falling back to `default` when it is missing or unreadable.
    pub async fn get_string(&mut self, key: SettingsKey, default: &str) -> String {
        match self.backend.read(self.namespace, key.as_str()).await {
            Ok(Some(value)) => value,
            Ok(None) => String::from(default),
            Err(e) => {
                error!("Failed to read {}/{}: {:?}", self.namespace, key.as_str(), e);
                String::from(default)
            }
        }
    }

    pub async fn put_string(&mut self, key: SettingsKey, value: &str) -> Result<(), StoreError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StoreError::ReadOnly);
        }

        self.backend
            .write(self.namespace, key.as_str(), value)
            .await
            .map_err(|e| {
                error!("Failed to write {}/{}: {:?}", self.namespace, key.as_str(), e);
                StoreError::Backend
            })
    }
}

impl<B: PreferencesBackend> Drop for Preferences<'_, B> {
    fn drop(&mut self) {
        trace!("Closed preferences '{}' ({:?})", self.namespace, self.mode);
    }
}

/// Settings store scoped to [`SETTINGS_NAMESPACE`].
pub struct SettingsStore<B: PreferencesBackend> {
    backend: B,
}

impl<B: PreferencesBackend> SettingsStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Open a session on the settings namespace.
    pub fn open(&mut self, mode: OpenMode) -> Preferences<'_, B> {
        trace!("Opening preferences '{}' ({:?})", SETTINGS_NAMESPACE, mode);
        Preferences {
            backend: &mut self.backend,
            namespace: SETTINGS_NAMESPACE,
            mode,
        }
    }

    pub async fn get(&mut self, key: SettingsKey, default: &str) -> String {
        self.open(OpenMode::ReadOnly).get_string(key, default).await
    }

    /// Write a single key; returns whether the write went through.
    pub async fn set(&mut self, key: SettingsKey, value: &str) -> bool {
        self.open(OpenMode::ReadWrite)
            .put_string(key, value)
            .await
            .is_ok()
    }

    /// Load the full settings record in one read-only session.
    pub async fn load(&mut self) -> Settings {
        let mut prefs = self.open(OpenMode::ReadOnly);
        Settings {
            ssid: prefs.get_string(SettingsKey::Ssid, "").await,
            password: prefs.get_string(SettingsKey::Password, "").await,
            trigger_url: prefs.get_string(SettingsKey::TriggerUrl, "").await,
        }
    }

    /// Persist Wi-Fi credentials as one batch of writes.
    pub async fn save_credentials(&mut self, ssid: &str, password: &str) -> bool {
        let mut prefs = self.open(OpenMode::ReadWrite);
        prefs.put_string(SettingsKey::Ssid, ssid).await.is_ok()
            && prefs.put_string(SettingsKey::Password, password).await.is_ok()
    }

    pub async fn save_trigger_url(&mut self, url: &str) -> bool {
        self.set(SettingsKey::TriggerUrl, url).await
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FailingBackend;
    use embassy_futures::block_on;

    #[test]
    fn test_read_after_write_returns_written_value() {
        let mut store = SettingsStore::new(MemoryBackend::new());

        for key in SettingsKey::ALL {
            assert!(block_on(store.set(key, "value-for-key")));
            assert_eq!(block_on(store.get(key, "")), "value-for-key");
        }
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let mut store = SettingsStore::new(MemoryBackend::new());

        let settings = block_on(store.load());

        assert_eq!(settings, Settings::default());
        assert_eq!(block_on(store.get(SettingsKey::Ssid, "fallback")), "fallback");
    }

    #[test]
    fn test_overwrite_keeps_last_value() {
        let mut store = SettingsStore::new(MemoryBackend::new());

        assert!(block_on(store.save_trigger_url("http://a.example/1")));
        assert!(block_on(store.save_trigger_url("http://a.example/2")));

        assert_eq!(block_on(store.load()).trigger_url, "http://a.example/2");
    }

    #[test]
    fn test_save_credentials_writes_both_keys() {
        let mut store = SettingsStore::new(MemoryBackend::new());

        assert!(block_on(store.save_credentials("HomeNet", "secret123")));

        let settings = block_on(store.load());
        assert_eq!(settings.ssid, "HomeNet");
        assert_eq!(settings.password, "secret123");
        assert!(settings.trigger_url.is_empty());
    }

    #[test]
    fn test_read_only_session_rejects_writes() {
        let mut store = SettingsStore::new(MemoryBackend::new());

        let result = block_on(
            store
                .open(OpenMode::ReadOnly)
                .put_string(SettingsKey::Ssid, "HomeNet"),
        );

        assert_eq!(result, Err(StoreError::ReadOnly));
        assert!(store.backend().is_empty());
    }

    #[test]
    fn test_keys_are_scoped_to_namespace() {
        let mut store = SettingsStore::new(MemoryBackend::new());
        block_on(store.set(SettingsKey::Ssid, "HomeNet"));

        assert_eq!(
            store.backend().get(SETTINGS_NAMESPACE, "ssid"),
            Some("HomeNet")
        );
        assert_eq!(store.backend().get("other", "ssid"), None);
    }

    #[test]
    fn test_backend_failure_reports_and_falls_back() {
        let mut store = SettingsStore::new(FailingBackend);

        assert!(!block_on(store.set(SettingsKey::TriggerUrl, "http://x")));
        assert!(!block_on(store.save_credentials("a", "b")));
        assert_eq!(block_on(store.get(SettingsKey::TriggerUrl, "dflt")), "dflt");
    }
}
