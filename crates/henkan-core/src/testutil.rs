//! In-memory collaborators for converter and prediction tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::converter::{Converter, ImmutableConverter, Rewriter};
use crate::dict::SuppressionList;
use crate::prediction::{CompositePredictor, PredictorPolicy, Predictor};
use crate::request::ConversionRequest;
use crate::segments::{Candidate, RequestType, Segment, SegmentType, Segments};

pub(crate) fn candidate(key: &str, value: &str, id: u16, cost: i32) -> Candidate {
    let mut c = Candidate::new(key, value);
    c.lid = id;
    c.rid = id;
    c.cost = cost;
    c.wcost = cost;
    c
}

/// Longest-match lattice stand-in.
///
/// FREE segments are split greedily by the longest known reading; unknown
/// characters become single-character segments whose only candidate is the
/// reading itself. FIXED_BOUNDARY segments keep their key. Prediction
/// requests fill the first segment with the exact-key candidates, limited
/// by the prediction budget.
#[derive(Default)]
pub(crate) struct FakeImmutableConverter {
    entries: HashMap<String, Vec<Candidate>>,
    /// surface → reading, for reverse conversion.
    readings: HashMap<String, String>,
    fail: AtomicBool,
    prediction_budgets: Mutex<Vec<usize>>,
}

impl FakeImmutableConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, key: &str, values: &[&str]) -> Self {
        let list = self.entries.entry(key.to_string()).or_default();
        for (i, value) in values.iter().enumerate() {
            list.push(candidate(key, value, 100 + list.len() as u16, 1000 * (i as i32 + 1)));
            self.readings
                .entry(value.to_string())
                .or_insert_with(|| key.to_string());
        }
        self
    }

    pub fn add_candidate(mut self, c: Candidate) -> Self {
        self.readings
            .entry(c.value.clone())
            .or_insert_with(|| c.key.clone());
        self.entries.entry(c.key.clone()).or_default().push(c);
        self
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn prediction_budgets(&self) -> Vec<usize> {
        self.prediction_budgets.lock().unwrap().clone()
    }

    fn candidates_for(&self, key: &str) -> Vec<Candidate> {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| vec![Candidate::new(key, key)])
    }

    fn split<'a>(table: impl Fn(&str) -> bool, key: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut rest = key;
        while !rest.is_empty() {
            let ends: Vec<usize> = rest
                .char_indices()
                .map(|(i, c)| i + c.len_utf8())
                .collect();
            let end = ends
                .iter()
                .rev()
                .copied()
                .find(|&e| table(&rest[..e]))
                .unwrap_or(ends[0]);
            pieces.push(&rest[..end]);
            rest = &rest[end..];
        }
        pieces
    }

    fn convert_reverse(&self, segments: &mut Segments) -> bool {
        let Some(key) = segments.conversion_segment(0).map(|s| s.key().to_string()) else {
            return false;
        };
        segments.clear_conversion_segments();
        for piece in Self::split(|s| self.readings.contains_key(s), &key) {
            let reading = self.readings.get(piece).cloned().unwrap_or_default();
            let segment = segments.add_segment();
            segment.set_key(piece);
            segment.push_candidate(Candidate::new(piece, reading));
        }
        segments.set_request_type(RequestType::ReverseConversion);
        true
    }

    fn convert_prediction(&self, segments: &mut Segments) -> bool {
        let budget = segments.max_prediction_candidates_size();
        self.prediction_budgets.lock().unwrap().push(budget);
        let Some(segment) = segments.conversion_segment_mut(0) else {
            return false;
        };
        let found: Vec<Candidate> = self
            .entries
            .get(segment.key())
            .map(|list| list.iter().take(budget).cloned().collect())
            .unwrap_or_default();
        for c in found {
            segment.push_candidate(c);
        }
        true
    }
}

impl ImmutableConverter for FakeImmutableConverter {
    fn convert(&self, segments: &mut Segments) -> bool {
        if self.fail.load(Ordering::SeqCst) {
            return false;
        }
        match segments.request_type() {
            RequestType::ReverseConversion => return self.convert_reverse(segments),
            RequestType::Prediction => return self.convert_prediction(segments),
            _ => {}
        }

        let mut i = segments.history_segments_size();
        while i < segments.segments_size() {
            let Some(segment) = segments.segment(i) else {
                break;
            };
            match segment.segment_type() {
                SegmentType::Free => {
                    let key = segment.key().to_string();
                    let pieces = Self::split(|s| self.entries.contains_key(s), &key);
                    let Ok(_) = segments.erase_segment(i) else {
                        return false;
                    };
                    for (j, piece) in pieces.iter().enumerate() {
                        let mut segment = Segment::new(*piece);
                        for c in self.candidates_for(piece) {
                            segment.push_candidate(c);
                        }
                        match segments.insert_segment(i + j) {
                            Ok(slot) => *slot = segment,
                            Err(_) => return false,
                        }
                    }
                    i += pieces.len();
                }
                SegmentType::FixedBoundary => {
                    let key = segment.key().to_string();
                    let Some(segment) = segments.segment_mut(i) else {
                        break;
                    };
                    segment.clear_candidates();
                    for c in self.candidates_for(&key) {
                        segment.push_candidate(c);
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }
        true
    }
}

/// Dictionary predictor over a fixed candidate list: every candidate whose
/// key starts with the query is a match, in list order.
pub(crate) struct FixedPredictor {
    name: &'static str,
    candidates: Vec<Candidate>,
    calls: Mutex<Vec<(RequestType, usize)>>,
    finished: AtomicUsize,
    reverted: AtomicUsize,
}

impl FixedPredictor {
    pub fn new(name: &'static str, pairs: &[(&str, &str)]) -> Self {
        Self {
            name,
            candidates: pairs.iter().map(|(k, v)| Candidate::new(*k, *v)).collect(),
            calls: Mutex::new(Vec::new()),
            finished: AtomicUsize::new(0),
            reverted: AtomicUsize::new(0),
        }
    }

    /// `count` candidates "<key>0", "<key>1", ... all keyed `key`.
    pub fn numbered(name: &'static str, key: &str, count: usize) -> Self {
        let pairs: Vec<(String, String)> = (0..count).map(|i| (key.to_string(), format!("{key}{i}"))).collect();
        let borrowed: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        Self::new(name, &borrowed)
    }

    /// (request type, budget) of every lookup so far.
    pub fn calls(&self) -> Vec<(RequestType, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn reverted(&self) -> usize {
        self.reverted.load(Ordering::SeqCst)
    }
}

impl Predictor for FixedPredictor {
    fn predict_for_request(&self, _request: &ConversionRequest, segments: &mut Segments) -> bool {
        let budget = segments.max_prediction_candidates_size();
        self.calls.lock().unwrap().push((segments.request_type(), budget));
        let Some(segment) = segments.conversion_segment_mut(0) else {
            return false;
        };
        let key = segment.key().to_string();
        let mut added = 0;
        for c in self.candidates.iter().filter(|c| c.key.starts_with(&key)) {
            if added >= budget {
                break;
            }
            if segment.candidates().iter().any(|e| e.value == c.value) {
                continue;
            }
            segment.push_candidate(c.clone());
            added += 1;
        }
        added > 0
    }

    fn finish(&self, _request: &ConversionRequest, _segments: &mut Segments) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn revert(&self, _segments: &mut Segments) {
        self.reverted.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Rewriter that changes nothing but reports a possible change, so the
/// suppression pass always runs.
#[derive(Default)]
pub(crate) struct RecordingRewriter {
    rewrites: AtomicUsize,
    finishes: AtomicUsize,
    focused: Mutex<Vec<(usize, i32)>>,
}

impl RecordingRewriter {
    pub fn rewrites(&self) -> usize {
        self.rewrites.load(Ordering::SeqCst)
    }

    pub fn finishes(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }

    pub fn focused(&self) -> Vec<(usize, i32)> {
        self.focused.lock().unwrap().clone()
    }
}

impl Rewriter for RecordingRewriter {
    fn rewrite(&self, _request: &ConversionRequest, _segments: &mut Segments) -> bool {
        self.rewrites.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn finish(&self, _request: &ConversionRequest, _segments: &mut Segments) {
        self.finishes.fetch_add(1, Ordering::SeqCst);
    }

    fn focus(&self, _segments: &mut Segments, segment_index: usize, candidate_index: i32) -> bool {
        self.focused.lock().unwrap().push((segment_index, candidate_index));
        true
    }
}

/// Readings used across converter tests.
pub(crate) fn test_lattice() -> FakeImmutableConverter {
    FakeImmutableConverter::new()
        .add("きょう", &["今日", "京", "強"])
        .add("と", &["と", "都"])
        .add("きょうと", &["京都"])
        .add("わたし", &["私", "渡し"])
        .add("は", &["は", "葉"])
        .add("いい", &["良い", "いい"])
        .add("てんき", &["天気", "転機"])
        .add("です", &["です"])
}

/// Everything a converter test needs to inspect after the fact.
pub(crate) struct Fixture {
    pub converter: Converter,
    pub lattice: Arc<FakeImmutableConverter>,
    pub history: Arc<FixedPredictor>,
    pub dictionary: Arc<FixedPredictor>,
    pub rewriter: Arc<RecordingRewriter>,
    pub suppression: Arc<SuppressionList>,
}

pub(crate) fn fixture_with(
    lattice: FakeImmutableConverter,
    history: FixedPredictor,
    dictionary: FixedPredictor,
) -> Fixture {
    let lattice = Arc::new(lattice);
    let history = Arc::new(history);
    let dictionary = Arc::new(dictionary);
    let rewriter = Arc::new(RecordingRewriter::default());
    let suppression = Arc::new(SuppressionList::new());
    let predictor = CompositePredictor::new(history.clone(), dictionary.clone(), PredictorPolicy::Default);
    let converter = Converter::new(
        Arc::new(predictor),
        rewriter.clone(),
        lattice.clone(),
        suppression.clone(),
    );
    Fixture {
        converter,
        lattice,
        history,
        dictionary,
        rewriter,
        suppression,
    }
}

pub(crate) fn fixture() -> Fixture {
    fixture_with(
        test_lattice(),
        FixedPredictor::new("history", &[]),
        FixedPredictor::new(
            "dictionary",
            &[
                ("きょう", "今日"),
                ("きょうと", "京都"),
                ("きょうは", "今日は"),
                ("わたし", "私"),
            ],
        ),
    )
}

/// Values of conversion segment `index`.
pub(crate) fn values(segments: &Segments, index: usize) -> Vec<String> {
    segments
        .conversion_segment(index)
        .map(|s| s.candidates().iter().map(|c| c.value.clone()).collect())
        .unwrap_or_default()
}

/// Keys of every conversion segment.
pub(crate) fn keys(segments: &Segments) -> Vec<String> {
    segments
        .conversion_segments()
        .iter()
        .map(|s| s.key().to_string())
        .collect()
}
