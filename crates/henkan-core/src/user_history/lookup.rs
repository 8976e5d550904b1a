//! Prediction from the history cache.

use std::collections::HashSet;

use crate::request::{ConversionRequest, EmojiCarrier, KeyExpansion, PreeditMethod};
use crate::romaji::to_roman;
use crate::segments::{Attributes, Candidate, RequestType, Segments};
use crate::settings::settings;
use crate::unicode::{char_len, char_substring, is_android_pua_emoji};

use super::cache::HistoryCache;
use super::entry::{fingerprint, Entry, EntryType};
use super::matching::{
    get_match_type, get_match_type_from_input, is_content_word, is_punctuation,
    maybe_roman_misspelled_key, roman_fuzzy_prefix_match, MatchType,
};
use super::queue::EntryPriorityQueue;
use super::{HistoryState, UserHistoryPredictor};

const EMOJI_DESCRIPTION: &str = "絵文字";

fn is_emoji_entry(entry: &Entry) -> bool {
    entry.description.contains(EMOJI_DESCRIPTION)
}

/// `prev` has a link to `entry`.
fn has_bigram_entry(entry: &Entry, prev: &Entry) -> bool {
    prev.has_next_entry(entry.fingerprint())
}

/// Pick the successor of `from` to continue a chain with. Successors typed
/// together share a timestamp, so one matching the left-most content word
/// wins, then one matching the nearest content word, then the newest.
fn select_next_entry<'a>(
    cache: &'a HistoryCache,
    from: &Entry,
    left_last_access_time: u64,
    left_most_last_access_time: u64,
    accept: impl Fn(&Entry) -> bool,
) -> Option<&'a Entry> {
    let mut latest: Option<&Entry> = None;
    let mut left_same: Option<&Entry> = None;
    let mut left_most_same: Option<&Entry> = None;
    for next in &from.next_entries {
        let Some(candidate) = cache.lookup(next.entry_fp) else {
            continue;
        };
        if candidate.key.is_empty() || !accept(candidate) {
            continue;
        }
        if latest.map_or(true, |l| l.last_access_time < candidate.last_access_time) {
            latest = Some(candidate);
        }
        if candidate.last_access_time == left_last_access_time {
            left_same = Some(candidate);
        }
        if candidate.last_access_time == left_most_last_access_time {
            left_most_same = Some(candidate);
        }
    }
    left_most_same.or(left_same).or(latest)
}

/// Romanized preedit when it looks like it contains a single romaji typo.
pub(super) fn get_roman_misspelled_key(request: &ConversionRequest, segments: &Segments) -> String {
    if request.config.preedit_method != PreeditMethod::Roman {
        return String::new();
    }
    let Some(segment) = segments.conversion_segment(0) else {
        return String::new();
    };
    let preedit = segment.key();
    if !preedit.is_empty() && maybe_roman_misspelled_key(preedit) {
        to_roman(preedit)
    } else {
        String::new()
    }
}

/// (input key, base key, ambiguous tails) for matching.
fn get_input_key_from_segments<'a>(
    request: &'a ConversionRequest,
    segments: &Segments,
) -> (String, String, Option<&'a KeyExpansion>) {
    let segment_key = segments
        .conversion_segment(0)
        .map(|s| s.key().to_string())
        .unwrap_or_default();
    match &request.composer {
        Some(composer) if request.config.enable_expansion => match &composer.expansion {
            Some(expansion) if !expansion.expanded.is_empty() => (
                composer.preedit.clone(),
                expansion.base.clone(),
                Some(expansion),
            ),
            _ => (
                composer.preedit.clone(),
                composer.prediction_query.clone(),
                None,
            ),
        },
        _ => (segment_key.clone(), segment_key, None),
    }
}

/// Whether `entry` may be shown for a suggestion after `prefix_len` typed
/// characters. Frequently used entries need a shorter prefix.
pub(super) fn is_valid_suggestion(zero_query: bool, prefix_len: usize, entry: &Entry) -> bool {
    if entry.bigram_boost || zero_query {
        return true;
    }
    let freq = entry.suggestion_freq.max(entry.conversion_freq / 4);
    let base_prefix_len = 3 - freq.min(2) as usize;
    prefix_len >= base_prefix_len
}

impl UserHistoryPredictor {
    fn is_valid_entry(&self, entry: &Entry, carrier: EmojiCarrier) -> bool {
        !entry.removed && self.is_valid_entry_ignoring_removed(entry, carrier)
    }

    fn is_valid_entry_ignoring_removed(&self, entry: &Entry, carrier: EmojiCarrier) -> bool {
        if entry.entry_type != EntryType::Default
            || self.suppression.suppress_entry(&entry.key, &entry.value)
        {
            return false;
        }
        if !is_emoji_entry(entry) {
            return true;
        }
        if is_android_pua_emoji(&entry.value) {
            carrier.intersects(EmojiCarrier::ANDROID)
        } else {
            carrier.intersects(EmojiCarrier::UNICODE)
        }
    }

    pub(super) fn predict(&self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        if self.syncer.is_running() {
            tracing::warn!("syncer is running");
            return false;
        }
        let config = &request.config;
        if config.incognito_mode {
            tracing::debug!("incognito mode");
            return false;
        }
        if segments.request_type() == RequestType::Conversion {
            tracing::debug!("request type is CONVERSION");
            return false;
        }
        if !config.use_history_suggest && segments.request_type() == RequestType::Suggestion {
            tracing::debug!("no history suggest");
            return false;
        }
        let Some(input_key) = segments.conversion_segment(0).map(|s| s.key().to_string()) else {
            tracing::debug!("segment size < 1");
            return false;
        };

        let mut guard = self.lock_state();
        guard.config = config.clone();
        let state: &HistoryState = &guard;
        if state.cache.is_empty() {
            tracing::debug!("history is empty");
            return false;
        }

        let zero_query = request.request.zero_query_suggestion;
        if is_punctuation(char_substring(&input_key, 0, 1)) {
            tracing::debug!("input key starts with punctuation");
            return false;
        }
        let input_key_len = char_len(&input_key);
        if input_key_len == 0 && !zero_query {
            tracing::debug!("key length is 0");
            return false;
        }

        let carrier = request.request.available_emoji_carrier;
        let prev_entry = self.lookup_prev_entry(state, segments, carrier);
        if input_key_len == 0 && prev_entry.is_none() {
            tracing::debug!("empty key needs a previous entry");
            return false;
        }

        let mut results = EntryPriorityQueue::new(settings().history.bigram_boost_secs);
        self.get_results(state, request, segments, prev_entry, &mut results);
        drop(guard);
        if results.is_empty() {
            tracing::debug!("no prefix match candidate is found");
            return false;
        }

        self.insert_candidates(zero_query, request, segments, &mut results)
    }

    /// Entry committed right before the current input, if it is known.
    ///
    /// Falls back to a bounded scan for an entry whose value ends the
    /// previous commit when the exact entry is gone or has no successors.
    fn lookup_prev_entry<'a>(
        &self,
        state: &'a HistoryState,
        segments: &Segments,
        carrier: EmojiCarrier,
    ) -> Option<&'a Entry> {
        let history_segment = segments.last_history_segment()?;
        let top = history_segment.candidate(0);
        let mut prev_entry = top.and_then(|c| state.cache.lookup(fingerprint(&c.key, &c.value)));

        let needs_scan = match prev_entry {
            None => top.is_some(),
            Some(e) => e.next_entries.is_empty(),
        };
        if !needs_scan {
            return prev_entry;
        }

        let prev_value = match (prev_entry, top) {
            (Some(e), _) => e.value.clone(),
            (None, Some(c)) => c.value.clone(),
            (None, None) => return None,
        };
        let trials = settings().history.max_prev_value_trial;
        for (_, entry) in state.cache.iter().take(trials) {
            let is_current = prev_entry.is_some_and(|p| std::ptr::eq(p, entry));
            if self.is_valid_entry(entry, carrier)
                && !is_current
                && !entry.next_entries.is_empty()
                && char_len(&entry.value) >= 2
                && prev_value.ends_with(entry.value.as_str())
            {
                prev_entry = Some(entry);
                break;
            }
        }
        prev_entry
    }

    fn get_results(
        &self,
        state: &HistoryState,
        request: &ConversionRequest,
        segments: &Segments,
        prev_entry: Option<&Entry>,
        results: &mut EntryPriorityQueue,
    ) {
        let s = &settings().history;
        let max_results = s.results_multiplier * segments.max_prediction_candidates_size();
        let roman_input_key = get_roman_misspelled_key(request, segments);
        let (input_key, base_key, expanded) = get_input_key_from_segments(request, segments);
        let carrier = request.request.available_emoji_carrier;
        let is_suggestion = segments.request_type() == RequestType::Suggestion;

        let mut trial = 0;
        for (_, entry) in state.cache.iter() {
            if !self.is_valid_entry_ignoring_removed(entry, carrier) {
                continue;
            }
            if is_suggestion {
                if trial >= s.max_suggestion_trial {
                    tracing::debug!("too many trials");
                    break;
                }
                trial += 1;
            }
            if !self.lookup_entry(
                state,
                &input_key,
                &base_key,
                expanded,
                entry,
                prev_entry,
                results,
            ) && !roman_fuzzy_lookup_entry(&roman_input_key, entry, results)
            {
                continue;
            }
            if results.len() >= max_results {
                break;
            }
        }
    }

    /// Copy of `base` with a new key and value. The copy is tombstoned if the
    /// new pair itself was deleted.
    fn entry_with_new_key_value(
        state: &HistoryState,
        key: String,
        value: String,
        base: &Entry,
    ) -> Entry {
        let removed = state
            .cache
            .lookup(fingerprint(&key, &value))
            .is_some_and(|e| e.removed);
        Entry {
            key,
            value,
            removed,
            ..base.clone()
        }
    }

    /// Match `entry` against the input, following chain links when the
    /// entry covers only part of it. Pushes at most two results: the match
    /// and its most likely next word.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn lookup_entry(
        &self,
        state: &HistoryState,
        input_key: &str,
        key_base: &str,
        key_expanded: Option<&KeyExpansion>,
        entry: &Entry,
        prev_entry: Option<&Entry>,
        results: &mut EntryPriorityQueue,
    ) -> bool {
        let cache = &state.cache;
        let content_time = |e: &Entry| {
            if is_content_word(&e.value) {
                e.last_access_time
            } else {
                0
            }
        };

        let (mut result, last_entry, left_last_access_time, left_most_last_access_time) =
            match get_match_type_from_input(input_key, key_base, key_expanded, &entry.key) {
                MatchType::NoMatch => return false,
                // Zero query: only successors of the previous commit qualify.
                MatchType::LeftEmptyMatch
                    if !prev_entry.is_some_and(|p| has_bigram_entry(entry, p)) =>
                {
                    return false
                }
                MatchType::LeftEmptyMatch | MatchType::LeftPrefixMatch => (
                    entry.clone(),
                    Some(entry),
                    entry.last_access_time,
                    content_time(entry),
                ),
                MatchType::RightPrefixMatch | MatchType::ExactMatch => {
                    let mut left_last = entry.last_access_time;
                    let mut left_most = content_time(entry);
                    let mut last_entry = None;
                    let mut key = entry.key.clone();
                    let mut value = entry.value.clone();
                    let mut current = entry;
                    let mut seen = HashSet::from([entry.fingerprint()]);
                    while key.len() <= input_key.len() {
                        let Some(next) = select_next_entry(cache, current, left_last, left_most, |e| {
                            let joined = format!("{key}{}", e.key);
                            !matches!(
                                get_match_type(&joined, input_key),
                                MatchType::NoMatch | MatchType::LeftEmptyMatch
                            )
                        }) else {
                            break;
                        };
                        // One timestamp per entry: a repeat means the
                        // timestamps can no longer be trusted.
                        if !seen.insert(next.fingerprint()) {
                            break;
                        }
                        key.push_str(&next.key);
                        value.push_str(&next.value);
                        current = next;
                        last_entry = Some(next);

                        let is_content = is_content_word(&next.value);
                        if is_content {
                            left_last = next.last_access_time;
                        }
                        if left_most == 0 && is_content {
                            left_most = next.last_access_time;
                        }
                    }
                    if key.len() < input_key.len() {
                        tracing::debug!("no prefix match even after following the chain");
                        return false;
                    }
                    (
                        Self::entry_with_new_key_value(state, key, value, entry),
                        last_entry,
                        left_last,
                        left_most,
                    )
                }
            };

        result.bigram_boost = prev_entry.is_some_and(|p| has_bigram_entry(entry, p));
        if !result.removed {
            results.push(result.clone());
        }

        // Also offer the word typed right after the match.
        let Some(last) = last_entry else {
            return true;
        };
        let result_key_len = char_len(&result.key);
        if result_key_len == 0 || 2 * char_len(input_key) < result_key_len {
            return true;
        }
        let next = select_next_entry(
            cache,
            last,
            left_last_access_time,
            left_most_last_access_time,
            |_| true,
        );
        if let Some(next) = next {
            let window = settings().history.chain_expansion_window_secs;
            if next.last_access_time.abs_diff(last.last_access_time) <= window
                && is_content_word(&next.value)
            {
                let expanded = Self::entry_with_new_key_value(
                    state,
                    format!("{}{}", result.key, next.key),
                    format!("{}{}", result.value, next.value),
                    &result,
                );
                if !expanded.removed {
                    results.push(expanded);
                }
            }
        }
        true
    }

    fn insert_candidates(
        &self,
        zero_query: bool,
        request: &ConversionRequest,
        segments: &mut Segments,
        results: &mut EntryPriorityQueue,
    ) -> bool {
        let request_type = segments.request_type();
        let max_candidates = segments.max_prediction_candidates_size();
        let long_candidate_chars = settings().history.long_candidate_chars;
        let Some(segment) = segments.conversion_segment_mut(0) else {
            tracing::error!("no conversion segment");
            return false;
        };
        let input_key_len = char_len(segment.key());
        let existing = segment.candidates_size();

        while segment.candidates_size() - existing < max_candidates {
            let Some(result) = results.pop() else {
                break;
            };
            // Expanding a kept list must not repeat what is already shown.
            if segment.candidates().iter().any(|c| c.value == result.value) {
                continue;
            }
            let is_valid = match request_type {
                RequestType::Prediction => true,
                // The top suggestion must be a valid one, otherwise a short
                // prefix of a frequent long word keeps suggesting it.
                RequestType::Suggestion => {
                    if is_valid_suggestion(zero_query, input_key_len, &result) {
                        true
                    } else if segment.candidates_size() == existing {
                        tracing::debug!("top result is not a valid suggestion");
                        return false;
                    } else {
                        false
                    }
                }
                other => {
                    tracing::debug!(?other, "unsupported request type");
                    return false;
                }
            };
            if !is_valid {
                continue;
            }
            if request.request.mixed_conversion
                && result.suggestion_freq < 2
                && char_len(&result.value) > long_candidate_chars
            {
                tracing::debug!(value = %result.value, "long candidate");
                continue;
            }

            let candidate = segment.push_candidate(Candidate::new(result.key, result.value));
            candidate.attributes |=
                Attributes::USER_HISTORY_PREDICTION | Attributes::NO_VARIANTS_EXPANSION;
            if result.spelling_correction {
                candidate.attributes |= Attributes::SPELLING_CORRECTION;
            }
            if !result.description.is_empty() {
                candidate.description = result.description;
                candidate.attributes |= Attributes::NO_EXTRA_DESCRIPTION;
            }
        }
        segment.candidates_size() > existing
    }
}

/// Match `entry` by its romanized key, tolerating one typo.
pub(super) fn roman_fuzzy_lookup_entry(
    roman_input_key: &str,
    entry: &Entry,
    results: &mut EntryPriorityQueue,
) -> bool {
    if roman_input_key.is_empty() {
        return false;
    }
    if !roman_fuzzy_prefix_match(&to_roman(&entry.key), roman_input_key) {
        return false;
    }
    let mut result = entry.clone();
    result.spelling_correction = true;
    if !result.removed {
        results.push(result);
    }
    true
}
