use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;

const DEFAULT_TOML: &str = include_str!("default_kana.toml");

#[derive(Deserialize)]
struct KanaFile {
    mappings: HashMap<String, String>,
}

/// Kana → romaji lookup with longest-match semantics.
#[derive(Debug, Default)]
pub struct KanaTable {
    map: HashMap<String, String>,
    max_key_chars: usize,
}

impl KanaTable {
    /// The embedded table, checked by `build.rs`.
    pub fn global() -> &'static KanaTable {
        static INSTANCE: OnceLock<KanaTable> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            Self::from_toml(DEFAULT_TOML).unwrap_or_else(|e| {
                tracing::error!(%e, "unreadable kana table");
                Self::default()
            })
        })
    }

    /// Parse a `[mappings]` table of kana to romaji.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let file: KanaFile = toml::from_str(toml_str)?;
        Ok(Self::from_map(file.mappings))
    }

    pub fn from_map(map: HashMap<String, String>) -> Self {
        let max_key_chars = map.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        Self { map, max_key_chars }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Longest table key at the start of `s`, returned as (romaji, bytes consumed).
    pub fn longest_match(&self, s: &str) -> Option<(&str, usize)> {
        let boundaries: Vec<usize> = s
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .take(self.max_key_chars)
            .collect();
        boundaries
            .into_iter()
            .rev()
            .find_map(|end| self.map.get(&s[..end]).map(|r| (r.as_str(), end)))
    }
}
