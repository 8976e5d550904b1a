use tracing::debug;

use super::candidate::Candidate;
use super::SegmentsError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SegmentType {
    /// Boundary and value both open.
    #[default]
    Free,
    /// Boundary set by the user, value open.
    FixedBoundary,
    /// Value chosen by the user; candidate 0 is the choice.
    FixedValue,
    /// Committed ahead of the rest of the composition.
    Submitted,
    /// Kept from an earlier conversion as left context.
    History,
}

/// A span of the reading and its ranked candidates.
///
/// Meta-candidates (transliterations) are addressed with negative indices:
/// `-1` is meta-candidate 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    key: String,
    segment_type: SegmentType,
    candidates: Vec<Candidate>,
    meta_candidates: Vec<Candidate>,
}

impl Segment {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    pub fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    pub fn set_segment_type(&mut self, segment_type: SegmentType) {
        self.segment_type = segment_type;
    }

    /// HISTORY and SUBMITTED segments form the history prefix of [`super::Segments`].
    pub fn is_history(&self) -> bool {
        matches!(
            self.segment_type,
            SegmentType::History | SegmentType::Submitted
        )
    }

    pub fn candidates_size(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidate(&self, i: usize) -> Option<&Candidate> {
        self.candidates.get(i)
    }

    pub fn candidate_mut(&mut self, i: usize) -> Option<&mut Candidate> {
        self.candidates.get_mut(i)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidates_mut(&mut self) -> &mut [Candidate] {
        &mut self.candidates
    }

    pub fn push_candidate(&mut self, candidate: Candidate) -> &mut Candidate {
        let i = self.candidates.len();
        self.candidates.push(candidate);
        &mut self.candidates[i]
    }

    pub fn push_front_candidate(&mut self, candidate: Candidate) -> &mut Candidate {
        self.insert_candidate(0, candidate)
    }

    /// Insert at `i`, clamped to the end of the list.
    pub fn insert_candidate(&mut self, i: usize, candidate: Candidate) -> &mut Candidate {
        let i = i.min(self.candidates.len());
        self.candidates.insert(i, candidate);
        &mut self.candidates[i]
    }

    pub fn erase_candidate(&mut self, i: usize) -> Result<Candidate, SegmentsError> {
        if i >= self.candidates.len() {
            return Err(SegmentsError::CandidateIndex {
                index: i as i64,
                size: self.candidates.len(),
            });
        }
        Ok(self.candidates.remove(i))
    }

    pub fn retain_candidates(&mut self, f: impl FnMut(&Candidate) -> bool) {
        self.candidates.retain(f);
    }

    pub fn clear_candidates(&mut self) {
        self.candidates.clear();
    }

    pub fn meta_candidates_size(&self) -> usize {
        self.meta_candidates.len()
    }

    pub fn meta_candidate(&self, i: usize) -> Option<&Candidate> {
        self.meta_candidates.get(i)
    }

    pub fn meta_candidates(&self) -> &[Candidate] {
        &self.meta_candidates
    }

    pub fn meta_candidates_mut(&mut self) -> &mut [Candidate] {
        &mut self.meta_candidates
    }

    pub fn push_meta_candidate(&mut self, candidate: Candidate) -> &mut Candidate {
        let i = self.meta_candidates.len();
        self.meta_candidates.push(candidate);
        &mut self.meta_candidates[i]
    }

    /// Reset to an empty FREE segment.
    pub fn clear(&mut self) {
        self.key.clear();
        self.segment_type = SegmentType::Free;
        self.candidates.clear();
        self.meta_candidates.clear();
    }

    /// Move candidate `old_idx` to `new_idx`, shifting the ones in between.
    ///
    /// A negative `old_idx` copies meta-candidate `-old_idx - 1` into the
    /// candidate list at `new_idx` instead.
    pub fn move_candidate(&mut self, old_idx: i32, new_idx: usize) -> Result<(), SegmentsError> {
        if old_idx < 0 {
            let meta_idx = (-(old_idx as i64) - 1) as usize;
            let Some(meta) = self.meta_candidates.get(meta_idx).cloned() else {
                return Err(SegmentsError::CandidateIndex {
                    index: old_idx as i64,
                    size: self.meta_candidates.len(),
                });
            };
            self.insert_candidate(new_idx, meta);
            return Ok(());
        }

        let old_idx = old_idx as usize;
        let size = self.candidates.len();
        if old_idx >= size {
            return Err(SegmentsError::CandidateIndex {
                index: old_idx as i64,
                size,
            });
        }
        if new_idx >= size {
            return Err(SegmentsError::CandidateIndex {
                index: new_idx as i64,
                size,
            });
        }
        if old_idx == new_idx {
            debug!(old_idx, "move_candidate: same position");
            return Ok(());
        }
        if old_idx > new_idx {
            self.candidates[new_idx..=old_idx].rotate_right(1);
        } else {
            self.candidates[old_idx..=new_idx].rotate_left(1);
        }
        Ok(())
    }
}
