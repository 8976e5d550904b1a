//! Suggestion and prediction entry points.

use crate::request::ConversionRequest;
use crate::segments::{Attributes, Candidate, RequestType, Segment, Segments};
use crate::unicode::{char_len, char_substring};

use super::{check_valid_segments, composer, set_key, Converter, ConverterError};

/// Mark `candidate` as consuming only the first `consumed_key_size`
/// characters, unless the predictor already did.
fn maybe_set_consumed_key_size(consumed_key_size: usize, candidate: &mut Candidate) {
    if candidate.attributes.contains(Attributes::PARTIALLY_KEY_CONSUMED) {
        return;
    }
    candidate.attributes |= Attributes::PARTIALLY_KEY_CONSUMED;
    candidate.consumed_key_size = consumed_key_size;
}

fn set_consumed_key_size(consumed_key_size: usize, segment: &mut Segment) {
    for c in segment.candidates_mut() {
        maybe_set_consumed_key_size(consumed_key_size, c);
    }
    for c in segment.meta_candidates_mut() {
        maybe_set_consumed_key_size(consumed_key_size, c);
    }
}

impl Converter {
    fn predict(
        &self,
        request: &ConversionRequest,
        key: &str,
        request_type: RequestType,
        segments: &mut Segments,
    ) -> Result<(), ConverterError> {
        // Expanding a shown prediction appends to it; anything else starts
        // over.
        let keep = matches!(
            segments.request_type(),
            RequestType::Prediction | RequestType::PartialPrediction
        ) && segments.conversion_segments_size() == 1
            && segments.conversion_segment(0).is_some_and(|s| s.key() == key);
        if !keep {
            set_key(segments, key);
        }

        segments.set_request_type(request_type);
        self.predictor.predict_for_request(request, segments);
        self.rewrite_and_suppress_candidates(request, segments);
        if request_type.is_partial() {
            if let Some(segment) = segments.conversion_segment_mut(0) {
                set_consumed_key_size(char_len(key), segment);
            }
        }
        check_valid_segments(request, segments)
    }

    pub fn start_prediction(&self, segments: &mut Segments, key: &str) -> Result<(), ConverterError> {
        self.predict(&ConversionRequest::new(), key, RequestType::Prediction, segments)
    }

    pub fn start_prediction_for_request(
        &self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) -> Result<(), ConverterError> {
        let key = composer(request)?.prediction_query.clone();
        self.predict(request, &key, RequestType::Prediction, segments)
    }

    pub fn start_suggestion(&self, segments: &mut Segments, key: &str) -> Result<(), ConverterError> {
        self.predict(&ConversionRequest::new(), key, RequestType::Suggestion, segments)
    }

    pub fn start_suggestion_for_request(
        &self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) -> Result<(), ConverterError> {
        let key = composer(request)?.prediction_query.clone();
        self.predict(request, &key, RequestType::Suggestion, segments)
    }

    pub fn start_partial_suggestion(&self, segments: &mut Segments, key: &str) -> Result<(), ConverterError> {
        self.predict(
            &ConversionRequest::new(),
            key,
            RequestType::PartialSuggestion,
            segments,
        )
    }

    /// Suggest for the composition up to the cursor. A cursor at either end
    /// covers the whole composition.
    pub fn start_partial_suggestion_for_request(
        &self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) -> Result<(), ConverterError> {
        let composer = composer(request)?;
        if composer.cursor == 0 || composer.cursor == composer.length {
            return self.start_suggestion_for_request(request, segments);
        }
        let key = char_substring(&composer.conversion_query, 0, composer.cursor).to_string();
        self.predict(request, &key, RequestType::PartialSuggestion, segments)
    }

    pub fn start_partial_prediction(&self, segments: &mut Segments, key: &str) -> Result<(), ConverterError> {
        self.predict(
            &ConversionRequest::new(),
            key,
            RequestType::PartialPrediction,
            segments,
        )
    }

    pub fn start_partial_prediction_for_request(
        &self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) -> Result<(), ConverterError> {
        let composer = composer(request)?;
        if composer.cursor == 0 || composer.cursor == composer.length {
            return self.start_prediction_for_request(request, segments);
        }
        let key = char_substring(&composer.conversion_query, 0, composer.cursor).to_string();
        self.predict(request, &key, RequestType::PartialPrediction, segments)
    }
}
