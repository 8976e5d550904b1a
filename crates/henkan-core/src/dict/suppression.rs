use std::collections::HashSet;
use std::sync::RwLock;

use super::SuppressionDictionary;

/// Runtime-editable suppression set.
///
/// An entry with an empty key suppresses the value under every reading; an
/// entry with an empty value suppresses every value of the reading.
#[derive(Debug, Default)]
pub struct SuppressionList {
    entries: RwLock<HashSet<(String, String)>>,
}

impl SuppressionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if both parts are empty or the entry already exists.
    pub fn add_entry(&self, key: &str, value: &str) -> bool {
        if key.is_empty() && value.is_empty() {
            return false;
        }
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert((key.to_string(), value.to_string()))
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl SuppressionDictionary for SuppressionList {
    fn suppress_entry(&self, key: &str, value: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        if entries.is_empty() {
            return false;
        }
        let probe = |k: &str, v: &str| entries.contains(&(k.to_string(), v.to_string()));
        probe(key, value) || probe("", value) || probe(key, "")
    }

    fn is_empty(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}
