use alloc::collections::BTreeMap;
use alloc::string::String;
use core::convert::Infallible;

use super::PreferencesBackend;

/// In-memory preferences backend.
///
/// Used directly by tests and as the working set of file-backed stores that
/// persist the whole map after each write.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: BTreeMap<(String, String), String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&str> {
        self.entries
            .get(&(String::from(namespace), String::from(key)))
            .map(String::as_str)
    }

    pub fn insert(&mut self, namespace: &str, key: &str, value: &str) {
        self.entries.insert(
            (String::from(namespace), String::from(key)),
            String::from(value),
        );
    }

    /// All entries as `(namespace, key, value)`, ordered by namespace then key.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.entries
            .iter()
            .map(|((ns, key), value)| (ns.as_str(), key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreferencesBackend for MemoryBackend {
    type Error = Infallible;

    async fn read(&mut self, namespace: &str, key: &str) -> Result<Option<String>, Infallible> {
        Ok(self.get(namespace, key).map(String::from))
    }

    async fn write(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), Infallible> {
        self.insert(namespace, key, value);
        Ok(())
    }
}
