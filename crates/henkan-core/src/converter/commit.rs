//! Committing, finishing and undoing conversions.

use crate::request::ConversionRequest;
use crate::segments::{Attributes, Candidate, RequestType, SegmentType, Segments};
use crate::settings::settings;
use crate::unicode::char_len;

use super::{segment_index, set_key, Converter, ConverterError, NUM_TRANSLITERATION_TYPES};

impl Converter {
    fn commit_segment_value_internal(
        &self,
        segments: &mut Segments,
        index: usize,
        candidate_index: i32,
        segment_type: SegmentType,
    ) -> Result<usize, ConverterError> {
        let absolute = segment_index(segments, index)?;
        let conversion_size = segments.conversion_segments_size();
        let segment = segments
            .segment_mut(absolute)
            .ok_or(ConverterError::InvalidSegmentIndex {
                index,
                size: conversion_size,
            })?;
        let size = segment.candidates_size();
        if candidate_index < -NUM_TRANSLITERATION_TYPES || candidate_index >= size as i32 {
            return Err(ConverterError::InvalidCandidateIndex {
                index: candidate_index,
                size,
            });
        }

        segment.move_candidate(candidate_index, 0)?;
        segment.set_segment_type(segment_type);
        if candidate_index != 0 {
            if let Some(top) = segment.candidate_mut(0) {
                top.attributes |= Attributes::RERANKED;
            }
        }
        Ok(absolute)
    }

    /// Fix conversion segment `index` to candidate `candidate_index`.
    pub fn commit_segment_value(
        &self,
        segments: &mut Segments,
        index: usize,
        candidate_index: i32,
    ) -> Result<(), ConverterError> {
        self.commit_segment_value_internal(segments, index, candidate_index, SegmentType::FixedValue)
            .map(|_| ())
    }

    /// Submit a suggestion that covers only part of the composition.
    ///
    /// The submitted segment is re-keyed to `current_segment_key` and a FREE
    /// segment keyed `new_segment_key` follows it with the rest of the input.
    pub fn commit_partial_suggestion_segment_value(
        &self,
        segments: &mut Segments,
        index: usize,
        candidate_index: i32,
        current_segment_key: &str,
        new_segment_key: &str,
    ) -> Result<(), ConverterError> {
        let absolute =
            self.commit_segment_value_internal(segments, index, candidate_index, SegmentType::Submitted)?;

        if let Some(segment) = segments.segment_mut(absolute) {
            let auto_partial = segment
                .candidate(0)
                .is_some_and(|c| char_len(&c.key) != char_len(segment.key()));
            tracing::debug!(auto_partial, "commit partial suggestion");
            segment.set_key(current_segment_key);
        }
        segments.insert_segment(absolute + 1)?.set_key(new_segment_key);
        Ok(())
    }

    /// Submit the first `candidate_indices.len()` conversion segments, each
    /// with its given candidate.
    pub fn commit_segments(
        &self,
        segments: &mut Segments,
        candidate_indices: &[i32],
    ) -> Result<(), ConverterError> {
        for &candidate_index in candidate_indices {
            // The submitted segment joins the history, so the next one is
            // again conversion segment 0.
            self.commit_segment_value_internal(segments, 0, candidate_index, SegmentType::Submitted)?;
        }
        Ok(())
    }

    pub fn focus_segment_value(
        &self,
        segments: &mut Segments,
        index: usize,
        candidate_index: i32,
    ) -> Result<bool, ConverterError> {
        let absolute = segment_index(segments, index)?;
        Ok(self.rewriter.focus(segments, absolute, candidate_index))
    }

    /// Release a fixed segment and convert again.
    pub fn free_segment_value(&self, segments: &mut Segments, index: usize) -> Result<(), ConverterError> {
        let absolute = segment_index(segments, index)?;
        if let Some(segment) = segments.segment_mut(absolute) {
            segment.set_segment_type(SegmentType::Free);
        }
        if segments.request_type() != RequestType::Conversion {
            return Err(ConverterError::WrongRequestType {
                expected: RequestType::Conversion,
                actual: segments.request_type(),
            });
        }
        if self.immutable_converter.convert(segments) {
            Ok(())
        } else {
            Err(ConverterError::ConversionFailed)
        }
    }

    /// Learn from the committed segments and keep the tail as history.
    pub fn finish_conversion(&self, request: &ConversionRequest, segments: &mut Segments) -> Result<(), ConverterError> {
        for segment in segments.iter_mut() {
            if segment.segment_type() == SegmentType::Submitted {
                segment.set_segment_type(SegmentType::FixedValue);
            }
            if let Some(top) = segment.candidate_mut(0) {
                self.complete_pos_ids(top);
            }
        }

        segments.clear_revert_entries();
        self.rewriter.finish(request, segments);
        self.predictor.finish(request, segments);

        let keep = segments.max_history_segments_size();
        let drop_count = segments.segments_size().saturating_sub(keep);
        for _ in 0..drop_count {
            segments.pop_front_segment();
        }
        for segment in segments.iter_mut() {
            segment.set_segment_type(SegmentType::History);
        }
        Ok(())
    }

    /// Undo what the last finish taught the predictor.
    pub fn revert_conversion(&self, segments: &mut Segments) -> Result<(), ConverterError> {
        if segments.revert_entries().is_empty() {
            return Ok(());
        }
        self.predictor.revert(segments);
        segments.clear_revert_entries();
        Ok(())
    }

    pub fn cancel_conversion(&self, segments: &mut Segments) -> Result<(), ConverterError> {
        segments.clear_conversion_segments();
        Ok(())
    }

    pub fn reset_conversion(&self, segments: &mut Segments) -> Result<(), ConverterError> {
        segments.clear();
        Ok(())
    }

    /// Fill in missing part-of-speech ids of a committed candidate by
    /// converting its key again with growing candidate budgets. Falls back to
    /// the general noun.
    pub(super) fn complete_pos_ids(&self, candidate: &mut Candidate) {
        if candidate.value.is_empty() || candidate.key.is_empty() {
            return;
        }
        if candidate.lid != 0 && candidate.rid != 0 {
            return;
        }
        candidate.lid = self.pos_ids.general_noun;
        candidate.rid = self.pos_ids.general_noun;

        let s = &settings().converter;
        let mut size = s.complete_pos_start;
        while size < s.complete_pos_max {
            let mut segments = Segments::new();
            set_key(&mut segments, &candidate.key);
            segments.set_request_type(RequestType::Prediction);
            segments.set_max_prediction_candidates_size(size);
            if !self.immutable_converter.convert(&mut segments) {
                tracing::error!(key = %candidate.key, "lattice search failed");
                return;
            }
            let found = segments
                .conversion_segment(0)
                .and_then(|seg| seg.candidates().iter().find(|c| c.value == candidate.value));
            if let Some(reference) = found {
                candidate.lid = reference.lid;
                candidate.rid = reference.rid;
                candidate.cost = reference.cost;
                candidate.wcost = reference.wcost;
                candidate.structure_cost = reference.structure_cost;
                tracing::debug!(lid = candidate.lid, rid = candidate.rid, "completed pos ids");
                return;
            }
            size += s.complete_pos_step;
        }
        tracing::debug!(
            key = %candidate.key,
            value = %candidate.value,
            "no pos ids found, using general noun"
        );
    }
}
