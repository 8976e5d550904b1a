use serde::{Deserialize, Serialize};

use crate::unicode::char_len;

const KEY_VALUE_DELIMITER: char = '\t';

/// Kind of a cache record. Event records carry no key or value and only mark
/// that a maintenance operation happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    #[default]
    Default,
    CleanAllEvent,
    CleanUnusedEvent,
}

impl EntryType {
    fn tag(self) -> u8 {
        match self {
            EntryType::Default => 1,
            EntryType::CleanAllEvent => 2,
            EntryType::CleanUnusedEvent => 3,
        }
    }
}

/// Outgoing chain link, addressed by the target's fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NextEntry {
    pub entry_fp: u32,
}

/// One learned (key, value) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub description: String,
    /// Seconds since the Unix epoch.
    pub last_access_time: u64,
    pub suggestion_freq: u32,
    pub conversion_freq: u32,
    /// Tombstone left by an explicit deletion. Links are kept for chaining.
    pub removed: bool,
    pub entry_type: EntryType,
    pub next_entries: Vec<NextEntry>,
    /// Lookup-time only: the previous commit links to this entry.
    #[serde(skip)]
    pub bigram_boost: bool,
    /// Lookup-time only: found by fuzzy romanized matching.
    #[serde(skip)]
    pub spelling_correction: bool,
}

impl Entry {
    /// Cache key of this record.
    pub fn fingerprint(&self) -> u32 {
        match self.entry_type {
            EntryType::Default => fingerprint(&self.key, &self.value),
            event => event_fingerprint(event),
        }
    }

    pub fn has_next_entry(&self, fp: u32) -> bool {
        self.next_entries.iter().any(|n| n.entry_fp == fp)
    }

    /// Drop every link to `fp`.
    pub fn erase_next_entries(&mut self, fp: u32) {
        self.next_entries.retain(|n| n.entry_fp != fp);
    }

    /// Ranking score: recency first, shorter values win ties, bigram
    /// successors get a fixed bonus.
    pub fn score(&self, bigram_boost_secs: u64) -> i64 {
        let boost = if self.bigram_boost {
            bigram_boost_secs as i64
        } else {
            0
        };
        self.last_access_time as i64 - char_len(&self.value) as i64 + boost
    }
}

/// 32-bit fingerprint of a (key, value) pair. Collisions are treated as the
/// same entry.
pub fn fingerprint(key: &str, value: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(key.as_bytes());
    let mut delimiter = [0u8; 4];
    hasher.update(KEY_VALUE_DELIMITER.encode_utf8(&mut delimiter).as_bytes());
    hasher.update(value.as_bytes());
    hasher.finalize()
}

/// Fingerprint of an event record, derived from its one-byte type tag.
pub fn event_fingerprint(entry_type: EntryType) -> u32 {
    crc32fast::hash(&[entry_type.tag()])
}
