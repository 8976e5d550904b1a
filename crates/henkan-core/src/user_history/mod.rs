//! Learned-history predictor.
//!
//! Every committed conversion is stored in an LRU cache keyed by a
//! fingerprint of (reading, surface). Consecutive commits are linked by
//! fingerprint, so lookups can follow the links to complete a multi-word
//! phrase from its first few characters. The cache is persisted by a
//! single background worker; lookups and learning never wait on I/O.

mod cache;
mod entry;
mod learning;
mod lookup;
mod matching;
mod persistence;
mod queue;
mod syncer;


use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

pub use cache::HistoryCache;
pub use entry::{event_fingerprint, fingerprint, Entry, EntryType, NextEntry};
pub use matching::{
    get_match_type, get_match_type_from_input, maybe_roman_misspelled_key,
    roman_fuzzy_prefix_match, MatchType,
};
pub use persistence::{decode, encode, FileStorage, HistoryError, HistoryStorage, MemoryStorage};
pub use syncer::SyncTask;

use crate::dict::{Dictionary, SuppressionDictionary};
use crate::prediction::Predictor;
use crate::request::{Config, ConversionRequest};
use crate::segments::{RevertKind, Segments};
use crate::settings::settings;

use syncer::Syncer;

/// Identifies revert tokens recorded by this predictor.
pub const REVERT_ID: u16 = 1;

pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Mutable state shared with the background worker.
#[derive(Debug)]
struct HistoryState {
    cache: HistoryCache,
    /// Changed since the last successful save.
    updated: bool,
    /// Configuration of the most recent request; gates saving.
    config: Config,
}

impl HistoryState {
    fn new() -> Self {
        Self {
            cache: HistoryCache::new(settings().history.cache_size),
            updated: false,
            config: Config::default(),
        }
    }
}

pub struct UserHistoryPredictor {
    state: Arc<Mutex<HistoryState>>,
    storage: Arc<dyn HistoryStorage>,
    dictionary: Arc<dyn Dictionary>,
    suppression: Arc<dyn SuppressionDictionary>,
    syncer: Syncer,
}

impl UserHistoryPredictor {
    /// Create a predictor and start loading `storage` in the background.
    pub fn new(
        dictionary: Arc<dyn Dictionary>,
        suppression: Arc<dyn SuppressionDictionary>,
        storage: Arc<dyn HistoryStorage>,
    ) -> Self {
        let predictor = Self {
            state: Arc::new(Mutex::new(HistoryState::new())),
            storage,
            dictionary,
            suppression,
            syncer: Syncer::new(),
        };
        predictor.async_load();
        predictor
    }

    fn lock_state(&self) -> MutexGuard<'_, HistoryState> {
        lock(&self.state)
    }

    /// Record the per-user switches that gate saving.
    pub fn set_config(&self, config: &Config) {
        self.lock_state().config = config.clone();
    }

    /// Number of cached records, events included.
    pub fn len(&self) -> usize {
        self.lock_state().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().cache.is_empty()
    }

    /// Copy of the record stored for (key, value).
    pub fn lookup(&self, key: &str, value: &str) -> Option<Entry> {
        self.lock_state()
            .cache
            .lookup(fingerprint(key, value))
            .cloned()
    }

    /// Copies of every record, most recently used first.
    pub fn entries(&self) -> Vec<Entry> {
        self.lock_state()
            .cache
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Synchronously load the stored history, merging it into the cache.
    /// Returns the number of records read.
    pub fn load(&self) -> Result<usize, HistoryError> {
        load_into(&self.state, self.storage.as_ref())
    }

    /// Synchronously save the cache if it changed and saving is allowed.
    pub fn save(&self) -> Result<(), HistoryError> {
        save_from(&self.state, self.storage.as_ref())
    }

    fn async_load(&self) -> bool {
        let state = Arc::clone(&self.state);
        let storage = Arc::clone(&self.storage);
        self.syncer.spawn(SyncTask::Load, move || {
            if let Err(e) = load_into(&state, storage.as_ref()) {
                tracing::error!(error = %e, "failed to load user history");
            }
        });
        true
    }

    fn async_save(&self) -> bool {
        if !self.lock_state().updated {
            return true;
        }
        let state = Arc::clone(&self.state);
        let storage = Arc::clone(&self.storage);
        self.syncer.spawn(SyncTask::Save, move || {
            if let Err(e) = save_from(&state, storage.as_ref()) {
                tracing::error!(error = %e, "failed to save user history");
            }
        });
        true
    }

    fn insert_event(state: &mut HistoryState, entry_type: EntryType, now: u64) {
        if entry_type == EntryType::Default {
            return;
        }
        *state.cache.insert(event_fingerprint(entry_type)) = Entry {
            entry_type,
            last_access_time: now,
            ..Entry::default()
        };
    }
}

fn lock(state: &Mutex<HistoryState>) -> MutexGuard<'_, HistoryState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn load_into(state: &Mutex<HistoryState>, storage: &dyn HistoryStorage) -> Result<usize, HistoryError> {
    let Some(bytes) = storage.load()? else {
        tracing::debug!("no stored user history");
        return Ok(0);
    };
    let entries = decode(&bytes)?;
    let count = entries.len();
    let mut state = lock(state);
    for entry in entries {
        let fp = entry.fingerprint();
        state.cache.insert_entry(fp, entry);
    }
    tracing::debug!(count, "loaded user history");
    Ok(count)
}

fn save_from(state: &Mutex<HistoryState>, storage: &dyn HistoryStorage) -> Result<(), HistoryError> {
    let entries: Vec<Entry> = {
        let state = lock(state);
        if !state.updated {
            return Ok(());
        }
        if state.config.incognito_mode {
            tracing::debug!("incognito mode, not saving");
            return Ok(());
        }
        if !state.config.use_history_suggest {
            tracing::debug!("history suggest disabled, not saving");
            return Ok(());
        }
        if state.cache.is_empty() {
            return Ok(());
        }
        state.cache.iter_lru().map(|(_, e)| e.clone()).collect()
    };
    storage.save(&encode(&entries)?)?;
    lock(state).updated = false;
    tracing::debug!(count = entries.len(), "saved user history");
    Ok(())
}

impl Predictor for UserHistoryPredictor {
    fn predict_for_request(&self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        self.predict(request, segments)
    }

    fn finish(&self, request: &ConversionRequest, segments: &mut Segments) {
        self.finish_at(request, segments, now_epoch());
    }

    fn revert(&self, segments: &mut Segments) {
        if self.syncer.is_running() {
            tracing::warn!("syncer is running");
            return;
        }
        let mut state = self.lock_state();
        for revert in segments.revert_entries() {
            if revert.id == REVERT_ID && revert.kind == RevertKind::CreateEntry {
                tracing::debug!(fp = revert.key, "erasing reverted entry");
                state.cache.erase(revert.key);
            }
        }
    }

    fn clear_all_history(&self) -> bool {
        self.syncer.wait();
        {
            let mut state = self.lock_state();
            state.cache = HistoryCache::new(settings().history.cache_size);
            Self::insert_event(&mut state, EntryType::CleanAllEvent, now_epoch());
            state.updated = true;
        }
        self.sync();
        true
    }

    fn clear_unused_history(&self) -> bool {
        self.syncer.wait();
        let removed = {
            let mut state = self.lock_state();
            if state.cache.is_empty() {
                tracing::debug!("history is empty");
                return false;
            }
            let unused: Vec<u32> = state
                .cache
                .iter()
                .filter(|(_, e)| e.suggestion_freq == 0)
                .map(|(fp, _)| fp)
                .collect();
            for fp in &unused {
                state.cache.erase(*fp);
            }
            Self::insert_event(&mut state, EntryType::CleanUnusedEvent, now_epoch());
            state.updated = true;
            unused.len()
        };
        tracing::debug!(removed, "cleared unused history");
        self.sync();
        true
    }

    fn clear_history_entry(&self, key: &str, value: &str) -> bool {
        let mut state = self.lock_state();
        let deleted = learning::clear_history_entry(&mut state.cache, key, value);
        if deleted {
            state.updated = true;
        }
        deleted
    }

    fn sync(&self) -> bool {
        self.async_save()
    }

    fn reload(&self) -> bool {
        self.syncer.wait();
        self.async_load()
    }

    fn wait(&self) -> bool {
        self.syncer.wait();
        true
    }

    fn name(&self) -> &str {
        "UserHistoryPredictor"
    }
}

impl Drop for UserHistoryPredictor {
    fn drop(&mut self) {
        self.syncer.wait();
        if let Err(e) = self.save() {
            tracing::error!(error = %e, "failed to save user history on shutdown");
        }
    }
}
