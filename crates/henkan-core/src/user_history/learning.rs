//! Learning from committed conversions, and targeted forgetting.

use std::collections::HashSet;

use crate::request::ConversionRequest;
use crate::segments::{Attributes, Candidate, RequestType, RevertEntry, RevertKind, SegmentType, Segments};
use crate::settings::settings;
use crate::unicode::{
    char_len, char_substring, contains_script, is_upper_or_capitalized_ascii, script_type_of,
    ScriptType,
};

use super::cache::HistoryCache;
use super::entry::{fingerprint, NextEntry};
use super::matching::is_punctuation;
use super::{HistoryState, UserHistoryPredictor, REVERT_ID};

/// A (key, value) pair as it will be learned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LearningSegment {
    pub key: String,
    pub value: String,
    pub description: String,
}

impl LearningSegment {
    fn fingerprint(&self) -> u32 {
        fingerprint(&self.key, &self.value)
    }
}

#[derive(Debug, Default)]
pub(super) struct LearningSegments {
    pub history: Vec<LearningSegment>,
    pub conversion: Vec<LearningSegment>,
}

/// Descriptions such as "did you mean" only make sense at the moment they
/// were shown, so corrections never keep theirs.
fn learned_description(candidate: &Candidate) -> String {
    let transient = Attributes::SPELLING_CORRECTION
        | Attributes::TYPING_CORRECTION
        | Attributes::AUTO_PARTIAL_SUGGESTION;
    if candidate.attributes.intersects(transient) {
        String::new()
    } else {
        candidate.description.clone()
    }
}

/// Top candidates of every segment. A conversion candidate spanning several
/// inner words is learned word by word.
pub(super) fn make_learning_segments(segments: &Segments) -> LearningSegments {
    let mut learning = LearningSegments::default();
    for segment in segments.history_segments() {
        if let Some(c) = segment.candidate(0) {
            learning.history.push(LearningSegment {
                key: c.key.clone(),
                value: c.value.clone(),
                description: learned_description(c),
            });
        }
    }
    for segment in segments.conversion_segments() {
        let Some(c) = segment.candidate(0) else {
            continue;
        };
        if c.inner_segment_boundary.is_empty() {
            learning.conversion.push(LearningSegment {
                key: c.key.clone(),
                value: c.value.clone(),
                description: learned_description(c),
            });
            continue;
        }
        let (mut key_pos, mut value_pos) = (0, 0);
        for &(key_len, value_len) in &c.inner_segment_boundary {
            learning.conversion.push(LearningSegment {
                key: char_substring(&c.key, key_pos, key_len).to_string(),
                value: char_substring(&c.value, value_pos, value_len).to_string(),
                description: String::new(),
            });
            key_pos += key_len;
            value_pos += value_len;
        }
    }
    learning
}

/// Add a link from `entry_fp` to `next_fp`. A full link list reuses, in
/// order: a link to the same target, a link whose target was evicted, the
/// link to the least recently used target.
pub(super) fn insert_next_entry(cache: &mut HistoryCache, entry_fp: u32, next_fp: u32) {
    if next_fp == 0 {
        return;
    }
    let max_next = settings().history.max_next_entries;
    let Some(entry) = cache.lookup(entry_fp) else {
        return;
    };

    let slot = if entry.next_entries.len() < max_next {
        Some(entry.next_entries.len())
    } else {
        let mut target: Option<usize> = None;
        let mut oldest = u64::MAX;
        for (i, next) in entry.next_entries.iter().enumerate() {
            if next.entry_fp == next_fp {
                target = Some(i);
                break;
            }
            let Some(found) = cache.lookup(next.entry_fp) else {
                target = Some(i);
                break;
            };
            if target.is_none() || oldest > found.last_access_time {
                target = Some(i);
                oldest = found.last_access_time;
            }
        }
        target
    };

    let Some(slot) = slot else {
        tracing::error!("no room for a next entry");
        return;
    };
    let Some(entry) = cache.lookup_mut(entry_fp) else {
        return;
    };
    let link = NextEntry { entry_fp: next_fp };
    if slot == entry.next_entries.len() {
        entry.next_entries.push(link);
    } else {
        entry.next_entries[slot] = link;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoveNgramChainResult {
    /// A link was severed.
    Done,
    /// This node completes the target.
    Tail,
    NotFound,
}

/// Depth-first search for a chain starting at `fp` whose concatenation is
/// exactly (target_key, target_value), severing the link into its last node.
#[allow(clippy::too_many_arguments)]
fn remove_ngram_chain(
    cache: &mut HistoryCache,
    target_key: &str,
    target_value: &str,
    fp: u32,
    key_ngrams: &mut Vec<String>,
    key_len: usize,
    value_ngrams: &mut Vec<String>,
    value_len: usize,
) -> RemoveNgramChainResult {
    let Some(entry) = cache.lookup(fp) else {
        return RemoveNgramChainResult::NotFound;
    };
    let key_len = key_len + entry.key.len();
    let value_len = value_len + entry.value.len();

    if key_len < target_key.len() && value_len < target_value.len() {
        key_ngrams.push(entry.key.clone());
        value_ngrams.push(entry.value.clone());
        let next_fps: Vec<u32> = entry.next_entries.iter().map(|n| n.entry_fp).collect();
        for next_fp in next_fps {
            if !cache.contains(next_fp) {
                continue;
            }
            match remove_ngram_chain(
                cache,
                target_key,
                target_value,
                next_fp,
                key_ngrams,
                key_len,
                value_ngrams,
                value_len,
            ) {
                RemoveNgramChainResult::Done => return RemoveNgramChainResult::Done,
                RemoveNgramChainResult::Tail => {
                    if let Some(e) = cache.lookup_mut(fp) {
                        e.erase_next_entries(next_fp);
                    }
                    return RemoveNgramChainResult::Done;
                }
                RemoveNgramChainResult::NotFound => {}
            }
        }
        key_ngrams.pop();
        value_ngrams.pop();
        return RemoveNgramChainResult::NotFound;
    }

    if key_len == target_key.len() && value_len == target_value.len() {
        key_ngrams.push(entry.key.clone());
        value_ngrams.push(entry.value.clone());
        if key_ngrams.concat() == target_key && value_ngrams.concat() == target_value {
            return RemoveNgramChainResult::Tail;
        }
        key_ngrams.pop();
        value_ngrams.pop();
    }
    RemoveNgramChainResult::NotFound
}

/// Tombstone (key, value) and cut every chain that would rebuild it.
pub(super) fn clear_history_entry(cache: &mut HistoryCache, key: &str, value: &str) -> bool {
    let mut deleted = false;

    if let Some(entry) = cache.lookup_mut(fingerprint(key, value)) {
        if !entry.removed {
            entry.suggestion_freq = 0;
            entry.conversion_freq = 0;
            entry.removed = true;
            deleted = true;
        }
    }

    for fp in cache.fingerprints() {
        let Some(entry) = cache.lookup(fp) else {
            continue;
        };
        if !key.starts_with(entry.key.as_str()) || !value.starts_with(entry.value.as_str()) {
            continue;
        }
        let (mut key_ngrams, mut value_ngrams) = (Vec::new(), Vec::new());
        if remove_ngram_chain(cache, key, value, fp, &mut key_ngrams, 0, &mut value_ngrams, 0)
            == RemoveNgramChainResult::Done
        {
            deleted = true;
        }
    }
    deleted
}

impl UserHistoryPredictor {
    /// Learn from `segments` as if committed at `now` (seconds since epoch).
    pub fn finish_at(&self, request: &ConversionRequest, segments: &mut Segments, now: u64) {
        if segments.request_type() == RequestType::ReverseConversion {
            return;
        }
        let mut state = self.lock_state();
        state.config = request.config.clone();
        if request.config.incognito_mode {
            tracing::debug!("incognito mode");
            return;
        }
        if !request.config.use_history_suggest {
            tracing::debug!("no history suggest");
            return;
        }
        if self.syncer.is_running() {
            tracing::warn!("syncer is running");
            return;
        }

        let is_suggestion = segments.request_type() != RequestType::Conversion;
        self.merge_trailing_punctuation(&mut state, segments, is_suggestion, now);

        for segment in segments.conversion_segments() {
            let Some(candidate) = segment.candidate(0) else {
                tracing::debug!("candidates size < 1");
                return;
            };
            if segment.segment_type() != SegmentType::FixedValue {
                tracing::debug!("segment is not FIXED_VALUE");
                return;
            }
            if candidate.attributes.contains(Attributes::NO_SUGGEST_LEARNING) {
                tracing::debug!("NO_SUGGEST_LEARNING");
                return;
            }
        }

        if self.is_privacy_sensitive(segments) {
            tracing::debug!("do not remember privacy sensitive input");
            return;
        }

        self.insert_history(&mut state, segments, is_suggestion, now);
    }

    /// A punctuation mark committed right after a sentence is also learned
    /// glued to that sentence, sharing its timestamp.
    fn merge_trailing_punctuation(
        &self,
        state: &mut HistoryState,
        segments: &mut Segments,
        is_suggestion: bool,
        now: u64,
    ) {
        let Some(head) = state.cache.head() else {
            return;
        };
        if segments.conversion_segments_size() != 1 {
            return;
        }
        let Some(last_history) = segments.last_history_segment().and_then(|s| s.candidate(0))
        else {
            return;
        };
        let Some(candidate) = segments.conversion_segment(0).and_then(|s| s.candidate(0)) else {
            return;
        };
        if char_len(&candidate.value) != 1 || !is_punctuation(&candidate.value) {
            return;
        }
        if head.last_access_time + settings().history.punctuation_merge_window_secs <= now {
            return;
        }
        if !head.value.ends_with(last_history.value.as_str()) {
            return;
        }
        let key = format!("{}{}", head.key, candidate.key);
        let value = format!("{}{}", head.value, candidate.value);
        let description = head.description.clone();
        let last_access_time = head.last_access_time;
        self.insert(
            state,
            &key,
            &value,
            &description,
            is_suggestion,
            0,
            last_access_time,
            segments,
        );
    }

    /// Whether the single committed value looks like a password or a
    /// number that should not be remembered.
    pub(super) fn is_privacy_sensitive(&self, segments: &Segments) -> bool {
        if segments.conversion_segments_size() != 1 {
            return false;
        }
        let Some(segment) = segments.conversion_segment(0) else {
            return false;
        };
        let Some(candidate) = segment.candidate(0) else {
            return false;
        };
        let key = segment.key();
        let value = candidate.value.as_str();

        if !value.is_ascii() {
            return false;
        }
        if script_type_of(key) == ScriptType::Number {
            return true;
        }
        if key.len() <= 3 {
            return false;
        }
        // English words are stored lower-cased.
        let in_dictionary = if is_upper_or_capitalized_ascii(value) {
            self.dictionary.has_value(&value.to_ascii_lowercase())
        } else {
            self.dictionary.has_value(value)
        };
        if in_dictionary {
            return false;
        }
        contains_script(key, ScriptType::Alphabet)
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn insert(
        &self,
        state: &mut HistoryState,
        key: &str,
        value: &str,
        description: &str,
        is_suggestion_selected: bool,
        next_fp: u32,
        last_access_time: u64,
        segments: &mut Segments,
    ) {
        let max_len = settings().history.max_string_length;
        if key.is_empty()
            || value.is_empty()
            || key.len() > max_len
            || value.len() > max_len
            || description.len() > max_len
        {
            return;
        }

        let fp = fingerprint(key, value);
        if !state.cache.contains(fp) {
            segments.push_revert_entry(RevertEntry {
                kind: RevertKind::CreateEntry,
                id: REVERT_ID,
                key: fp,
            });
        }

        let entry = state.cache.insert(fp);
        entry.key = key.to_string();
        entry.value = value.to_string();
        entry.removed = false;
        entry.description = description.to_string();
        entry.last_access_time = last_access_time;
        if is_suggestion_selected {
            entry.suggestion_freq += 1;
        } else {
            entry.conversion_freq += 1;
        }
        insert_next_entry(&mut state.cache, fp, next_fp);
        tracing::debug!(key, value, "inserted");
        state.updated = true;
    }

    fn insert_history(
        &self,
        state: &mut HistoryState,
        segments: &mut Segments,
        is_suggestion_selected: bool,
        last_access_time: u64,
    ) {
        let learning = make_learning_segments(segments);
        let all: Vec<&LearningSegment> = learning
            .history
            .iter()
            .chain(learning.conversion.iter())
            .collect();
        let history_size = learning.history.len();

        let mut all_key = String::new();
        let mut all_value = String::new();
        let mut seen: HashSet<u32> = HashSet::new();
        let mut this_was_seen = false;

        for i in history_size..all.len() {
            let segment = all[i];
            all_key.push_str(&segment.key);
            all_value.push_str(&segment.value);
            let next_fp = all.get(i + 1).map_or(0, |next| next.fingerprint());
            if i == history_size {
                seen.insert(segment.fingerprint());
            }
            // A repeated segment loses its links in both directions so that
            // chains never loop.
            let mut next_fp_to_set = if this_was_seen { 0 } else { next_fp };
            if seen.insert(next_fp) {
                this_was_seen = false;
            } else {
                next_fp_to_set = 0;
                this_was_seen = true;
            }
            self.insert(
                state,
                &segment.key,
                &segment.value,
                &segment.description,
                is_suggestion_selected,
                next_fp_to_set,
                last_access_time,
                segments,
            );
        }

        if learning.conversion.len() > 1 && !all_key.is_empty() && !all_value.is_empty() {
            self.insert(
                state,
                &all_key,
                &all_value,
                "",
                is_suggestion_selected,
                0,
                last_access_time,
                segments,
            );
        }

        if let (Some(last_history), Some(first_conversion)) =
            (learning.history.last(), learning.conversion.first())
        {
            let history_fp = last_history.fingerprint();
            let request_type = segments.request_type();
            if request_type == RequestType::Conversion {
                insert_next_entry(&mut state.cache, history_fp, first_conversion.fingerprint());
            }
            if request_type != RequestType::Conversion || learning.conversion.len() > 1 {
                insert_next_entry(
                    &mut state.cache,
                    history_fp,
                    fingerprint(&all_key, &all_value),
                );
            }
        }
    }
}
