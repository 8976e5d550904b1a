//! Conversion session driver.
//!
//! Every client operation on an in-flight [`Segments`] goes through
//! [`Converter`]: starting a conversion or prediction, committing, resizing,
//! reverting and finishing. Public segment indices always address the
//! conversion region, so callers never need to know how many history
//! segments precede it.
//!
//! The lattice search ([`ImmutableConverter`]), candidate post-processing
//! ([`Rewriter`]) and prediction ([`Predictor`]) are collaborators passed in
//! at construction.

mod commit;
mod history;
mod predict;
mod resize;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::dict::SuppressionDictionary;
use crate::prediction::Predictor;
use crate::request::{ComposerState, ConversionRequest, KeySelection};
use crate::segments::{RequestType, SegmentType, Segments, SegmentsError};
use crate::settings::settings;

pub use history::{extract_last_token_with_script_type, normalize_math_expression};

/// Number of transliteration forms addressable as meta-candidates
/// (`-1..=-NUM_TRANSLITERATION_TYPES`).
pub const NUM_TRANSLITERATION_TYPES: i32 = 11;

/// Lattice search producing raw candidates for FREE and FIXED_BOUNDARY
/// segments whose keys are already set.
pub trait ImmutableConverter: Send + Sync {
    fn convert(&self, segments: &mut Segments) -> bool;

    fn convert_for_request(&self, _request: &ConversionRequest, segments: &mut Segments) -> bool {
        self.convert(segments)
    }
}

/// Post-processing of candidate lists (symbols, emoji, variants, ...).
pub trait Rewriter: Send + Sync {
    /// Returns whether anything may have changed.
    fn rewrite(&self, request: &ConversionRequest, segments: &mut Segments) -> bool;

    fn finish(&self, _request: &ConversionRequest, _segments: &mut Segments) {}

    fn focus(&self, _segments: &mut Segments, _segment_index: usize, _candidate_index: i32) -> bool {
        true
    }
}

/// Rewriter that leaves every candidate list as it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRewriter;

impl Rewriter for NoopRewriter {
    fn rewrite(&self, _request: &ConversionRequest, _segments: &mut Segments) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConverterError {
    #[error("conversion segment index {index} out of range (size {size})")]
    InvalidSegmentIndex { index: usize, size: usize },
    #[error("candidate index {index} out of range (size {size})")]
    InvalidCandidateIndex { index: i32, size: usize },
    #[error("cannot resize segment {index} by {offset}")]
    InvalidResize { index: usize, offset: i32 },
    #[error("cannot resize {count} segments from {start} into {sizes} parts")]
    InvalidResizeRange {
        start: usize,
        count: usize,
        sizes: usize,
    },
    #[error("operation needs a {expected:?} request, got {actual:?}")]
    WrongRequestType {
        expected: RequestType,
        actual: RequestType,
    },
    #[error("empty key")]
    EmptyKey,
    #[error("request has no composer")]
    NoComposer,
    #[error("no candidates")]
    NoCandidates,
    #[error("lattice search failed")]
    ConversionFailed,
    #[error("no connective context in preceding text")]
    NoHistoryContext,
    #[error(transparent)]
    Segments(#[from] SegmentsError),
}

/// Part-of-speech ids the converter assigns on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosIds {
    pub general_noun: u16,
    pub number: u16,
    pub unique_noun: u16,
}

impl Default for PosIds {
    fn default() -> Self {
        let s = &settings().converter;
        Self {
            general_noun: s.general_noun_id,
            number: s.number_id,
            unique_noun: s.unique_noun_id,
        }
    }
}

pub struct Converter {
    predictor: Arc<dyn Predictor>,
    rewriter: Arc<dyn Rewriter>,
    immutable_converter: Arc<dyn ImmutableConverter>,
    suppression: Arc<dyn SuppressionDictionary>,
    pos_ids: PosIds,
}

impl Converter {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        rewriter: Arc<dyn Rewriter>,
        immutable_converter: Arc<dyn ImmutableConverter>,
        suppression: Arc<dyn SuppressionDictionary>,
    ) -> Self {
        Self {
            predictor,
            rewriter,
            immutable_converter,
            suppression,
            pos_ids: PosIds::default(),
        }
    }

    pub fn with_pos_ids(mut self, pos_ids: PosIds) -> Self {
        self.pos_ids = pos_ids;
        self
    }

    pub fn predictor(&self) -> &Arc<dyn Predictor> {
        &self.predictor
    }

    /// Convert `key` as one FREE segment.
    pub fn start_conversion(&self, segments: &mut Segments, key: &str) -> Result<(), ConverterError> {
        self.start_conversion_for_request(&ConversionRequest::new(), segments, key)
    }

    /// Convert the composer query chosen by `request.key_selection`.
    pub fn start_conversion_with_composer(
        &self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) -> Result<(), ConverterError> {
        let composer = composer(request)?;
        let key = match request.key_selection {
            KeySelection::Conversion => composer.conversion_query.clone(),
            KeySelection::Prediction => composer.prediction_query.clone(),
        };
        self.start_conversion_for_request(request, segments, &key)
    }

    fn start_conversion_for_request(
        &self,
        request: &ConversionRequest,
        segments: &mut Segments,
        key: &str,
    ) -> Result<(), ConverterError> {
        if key.is_empty() {
            return Err(ConverterError::EmptyKey);
        }
        set_key(segments, key);
        segments.set_request_type(RequestType::Conversion);
        if !self.immutable_converter.convert_for_request(request, segments) {
            tracing::debug!(key, "lattice search found nothing");
        }
        self.rewrite_and_suppress_candidates(request, segments);
        check_valid_segments(request, segments)
    }

    /// Convert surface text back to its reading.
    ///
    /// Arithmetic such as "365*24=" has no useful reading and comes back as
    /// its half-width normalization.
    pub fn start_reverse_conversion(&self, segments: &mut Segments, key: &str) -> Result<(), ConverterError> {
        segments.clear();
        if key.is_empty() {
            return Err(ConverterError::EmptyKey);
        }
        set_key(segments, key);

        if let Some(value) = normalize_math_expression(key) {
            if let Some(segment) = segments.conversion_segment_mut(0) {
                segment.push_candidate(crate::segments::Candidate::new(key, value));
            }
            return Ok(());
        }

        segments.set_request_type(RequestType::ReverseConversion);
        if !self.immutable_converter.convert(segments) {
            return Err(ConverterError::ConversionFailed);
        }
        if segments.is_empty() {
            tracing::warn!("no segments from reverse conversion");
            return Err(ConverterError::NoCandidates);
        }
        let has_empty = segments
            .iter()
            .any(|s| s.candidate(0).map_or(true, |c| c.value.is_empty()));
        if has_empty {
            tracing::warn!("got an empty segment from reverse conversion");
            segments.clear();
            return Err(ConverterError::NoCandidates);
        }
        Ok(())
    }

    /// Run the rewriter, then drop suppressed candidates from the conversion
    /// region.
    pub fn rewrite_and_suppress_candidates(&self, request: &ConversionRequest, segments: &mut Segments) {
        if !self.rewriter.rewrite(request, segments) {
            return;
        }
        if self.suppression.is_empty() {
            return;
        }
        for segment in segments.conversion_segments_mut() {
            segment.retain_candidates(|c| !self.suppression.suppress_entry(&c.key, &c.value));
        }
    }
}

/// Absolute index of conversion segment `index`.
pub fn segment_index(segments: &Segments, index: usize) -> Result<usize, ConverterError> {
    let absolute = segments.history_segments_size() + index;
    if absolute >= segments.segments_size() {
        return Err(ConverterError::InvalidSegmentIndex {
            index,
            size: segments.conversion_segments_size(),
        });
    }
    Ok(absolute)
}

/// Replace the conversion region with one FREE segment keyed `key`.
fn set_key(segments: &mut Segments, key: &str) {
    segments.set_max_history_segments_size(settings().converter.max_history_segments);
    segments.clear_conversion_segments();
    let segment = segments.add_segment();
    segment.set_key(key);
    segment.set_segment_type(SegmentType::Free);
    tracing::debug!(%segments, "set key");
}

fn composer(request: &ConversionRequest) -> Result<&ComposerState, ConverterError> {
    request.composer.as_ref().ok_or_else(|| {
        tracing::error!("request has no composer");
        ConverterError::NoComposer
    })
}

/// Every segment has a candidate. Mobile clients show meta-candidates in the
/// same list, so those count there.
fn check_valid_segments(request: &ConversionRequest, segments: &Segments) -> Result<(), ConverterError> {
    let mobile = request.request.is_mobile();
    let valid = segments
        .iter()
        .all(|s| s.candidates_size() != 0 || (mobile && s.meta_candidates_size() != 0));
    if valid {
        Ok(())
    } else {
        Err(ConverterError::NoCandidates)
    }
}
