//! The conversion document: an ordered list of segments, each with ranked
//! candidates.
//!
//! Leading HISTORY/SUBMITTED segments form the history prefix; everything
//! after is the conversion region. The split point is always recomputed from
//! segment types, never stored.

mod candidate;
mod segment;


use std::fmt;

pub use candidate::{Attributes, Candidate};
pub use segment::{Segment, SegmentType};

const MAX_HISTORY_SIZE: usize = 32;
const MAX_CONVERSION_CANDIDATES_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentsError {
    #[error("segment index {index} out of range (size {size})")]
    SegmentIndex { index: usize, size: usize },
    #[error("candidate index {index} out of range (size {size})")]
    CandidateIndex { index: i64, size: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RequestType {
    #[default]
    Conversion,
    ReverseConversion,
    Prediction,
    Suggestion,
    PartialPrediction,
    PartialSuggestion,
}

impl RequestType {
    pub fn is_partial(self) -> bool {
        matches!(
            self,
            RequestType::PartialPrediction | RequestType::PartialSuggestion
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevertKind {
    /// The entry did not exist before this turn; reverting erases it.
    CreateEntry,
}

/// Undo token recorded by a learner during `finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertEntry {
    pub kind: RevertKind,
    /// Which learner recorded the token.
    pub id: u16,
    /// Learner-specific key, the history fingerprint for the history predictor.
    pub key: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    segments: Vec<Segment>,
    request_type: RequestType,
    max_history_segments_size: usize,
    max_prediction_candidates_size: usize,
    max_conversion_candidates_size: usize,
    resized: bool,
    user_history_enabled: bool,
    revert_entries: Vec<RevertEntry>,
}

impl Default for Segments {
    fn default() -> Self {
        Self::new()
    }
}

impl Segments {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            request_type: RequestType::Conversion,
            max_history_segments_size: 0,
            max_prediction_candidates_size: 0,
            max_conversion_candidates_size: MAX_CONVERSION_CANDIDATES_SIZE,
            resized: false,
            user_history_enabled: true,
            revert_entries: Vec::new(),
        }
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn set_request_type(&mut self, request_type: RequestType) {
        self.request_type = request_type;
    }

    pub fn max_history_segments_size(&self) -> usize {
        self.max_history_segments_size
    }

    /// Clamped to 32.
    pub fn set_max_history_segments_size(&mut self, size: usize) {
        self.max_history_segments_size = size.min(MAX_HISTORY_SIZE);
    }

    pub fn max_prediction_candidates_size(&self) -> usize {
        self.max_prediction_candidates_size
    }

    pub fn set_max_prediction_candidates_size(&mut self, size: usize) {
        self.max_prediction_candidates_size = size;
    }

    pub fn max_conversion_candidates_size(&self) -> usize {
        self.max_conversion_candidates_size
    }

    pub fn set_max_conversion_candidates_size(&mut self, size: usize) {
        self.max_conversion_candidates_size = size;
    }

    pub fn resized(&self) -> bool {
        self.resized
    }

    pub fn set_resized(&mut self, resized: bool) {
        self.resized = resized;
    }

    pub fn user_history_enabled(&self) -> bool {
        self.user_history_enabled
    }

    pub fn set_user_history_enabled(&mut self, enabled: bool) {
        self.user_history_enabled = enabled;
    }

    // --- segment access ---

    pub fn segments_size(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, i: usize) -> Option<&Segment> {
        self.segments.get(i)
    }

    pub fn segment_mut(&mut self, i: usize) -> Option<&mut Segment> {
        self.segments.get_mut(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Segment> {
        self.segments.iter_mut()
    }

    /// Number of leading HISTORY/SUBMITTED segments.
    pub fn history_segments_size(&self) -> usize {
        self.segments.iter().take_while(|s| s.is_history()).count()
    }

    pub fn conversion_segments_size(&self) -> usize {
        self.segments.len() - self.history_segments_size()
    }

    pub fn history_segments(&self) -> &[Segment] {
        &self.segments[..self.history_segments_size()]
    }

    pub fn conversion_segments(&self) -> &[Segment] {
        &self.segments[self.history_segments_size()..]
    }

    pub fn conversion_segments_mut(&mut self) -> &mut [Segment] {
        let start = self.history_segments_size();
        &mut self.segments[start..]
    }

    pub fn history_segment(&self, i: usize) -> Option<&Segment> {
        self.history_segments().get(i)
    }

    /// The right-most history segment, the left context of the conversion.
    pub fn last_history_segment(&self) -> Option<&Segment> {
        self.history_segments().last()
    }

    pub fn conversion_segment(&self, i: usize) -> Option<&Segment> {
        self.conversion_segments().get(i)
    }

    pub fn conversion_segment_mut(&mut self, i: usize) -> Option<&mut Segment> {
        self.conversion_segments_mut().get_mut(i)
    }

    // --- segment mutation ---

    pub fn add_segment(&mut self) -> &mut Segment {
        self.push_segment(Segment::default())
    }

    pub fn push_segment(&mut self, segment: Segment) -> &mut Segment {
        let i = self.segments.len();
        self.segments.push(segment);
        &mut self.segments[i]
    }

    /// Insert an empty FREE segment at `i` (`i == segments_size()` appends).
    pub fn insert_segment(&mut self, i: usize) -> Result<&mut Segment, SegmentsError> {
        if i > self.segments.len() {
            return Err(SegmentsError::SegmentIndex {
                index: i,
                size: self.segments.len(),
            });
        }
        self.segments.insert(i, Segment::default());
        Ok(&mut self.segments[i])
    }

    pub fn erase_segment(&mut self, i: usize) -> Result<Segment, SegmentsError> {
        if i >= self.segments.len() {
            return Err(SegmentsError::SegmentIndex {
                index: i,
                size: self.segments.len(),
            });
        }
        Ok(self.segments.remove(i))
    }

    /// Erase `n` segments starting at `i`; nothing is erased unless the whole
    /// range exists.
    pub fn erase_segments(&mut self, i: usize, n: usize) -> Result<(), SegmentsError> {
        let end = i.saturating_add(n);
        if i >= self.segments.len() || end > self.segments.len() {
            return Err(SegmentsError::SegmentIndex {
                index: end.max(i),
                size: self.segments.len(),
            });
        }
        self.segments.drain(i..end);
        Ok(())
    }

    pub fn pop_front_segment(&mut self) -> Option<Segment> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.segments.remove(0))
        }
    }

    pub fn pop_back_segment(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    /// Move candidate `from` to `to` within segment `segment_index`.
    pub fn move_candidate(
        &mut self,
        segment_index: usize,
        from: i32,
        to: usize,
    ) -> Result<(), SegmentsError> {
        let size = self.segments.len();
        self.segments
            .get_mut(segment_index)
            .ok_or(SegmentsError::SegmentIndex {
                index: segment_index,
                size,
            })?
            .move_candidate(from, to)
    }

    /// Drop every segment and revert entry.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.revert_entries.clear();
    }

    pub fn clear_segments(&mut self) {
        self.segments.clear();
    }

    pub fn clear_history_segments(&mut self) {
        let n = self.history_segments_size();
        self.segments.drain(..n);
    }

    pub fn clear_conversion_segments(&mut self) {
        let n = self.history_segments_size();
        self.segments.truncate(n);
        self.resized = false;
    }

    // --- revert entries ---

    pub fn revert_entries(&self) -> &[RevertEntry] {
        &self.revert_entries
    }

    pub fn push_revert_entry(&mut self, entry: RevertEntry) {
        self.revert_entries.push(entry);
    }

    pub fn clear_revert_entries(&mut self) {
        self.revert_entries.clear();
    }
}

impl fmt::Display for Segments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Segments ({:?})", self.request_type)?;
        for (i, seg) in self.segments.iter().enumerate() {
            writeln!(f, "[{i}] key={} type={:?}", seg.key(), seg.segment_type())?;
            for (j, cand) in seg.candidates().iter().enumerate() {
                writeln!(f, "    {j}: {cand}")?;
            }
            for (j, cand) in seg.meta_candidates().iter().enumerate() {
                writeln!(f, "    -{}: {cand}", j + 1)?;
            }
        }
        Ok(())
    }
}
