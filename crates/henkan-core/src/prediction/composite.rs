use std::sync::Arc;

use crate::converter::ImmutableConverter;
use crate::request::{ClientRequest, ConversionRequest};
use crate::segments::{RequestType, Segments};
use crate::settings::settings;
use crate::unicode::is_hiragana;

use super::Predictor;

/// Candidate budget policy of a [`CompositePredictor`].
///
/// `Default` shares one budget between history and dictionary, history
/// first. `Mobile` gives history a small budget of its own on top of a much
/// larger dictionary budget, since mobile clients scroll long lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PredictorPolicy {
    #[default]
    Default,
    Mobile,
}

impl PredictorPolicy {
    pub fn for_client(request: &ClientRequest) -> Self {
        if request.is_mobile() {
            Self::Mobile
        } else {
            Self::Default
        }
    }
}

/// Learned history merged with a dictionary predictor.
///
/// Only the history side learns; maintenance operations go there alone.
pub struct CompositePredictor {
    history: Arc<dyn Predictor>,
    dictionary: Arc<dyn Predictor>,
    policy: PredictorPolicy,
    /// Recovers readings of committed candidates that lack one (mobile only).
    reverse_converter: Option<Arc<dyn ImmutableConverter>>,
}

impl CompositePredictor {
    pub fn new(history: Arc<dyn Predictor>, dictionary: Arc<dyn Predictor>, policy: PredictorPolicy) -> Self {
        Self {
            history,
            dictionary,
            policy,
            reverse_converter: None,
        }
    }

    pub fn with_reverse_converter(mut self, converter: Arc<dyn ImmutableConverter>) -> Self {
        self.reverse_converter = Some(converter);
        self
    }

    pub fn policy(&self) -> PredictorPolicy {
        self.policy
    }

    fn predict_default(&self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        if request.config.presentation_mode {
            tracing::debug!("presentation mode");
            return false;
        }
        let s = &settings().prediction;
        let size = match segments.request_type() {
            RequestType::Suggestion => request.config.suggestions_size.clamp(1, s.max_suggestions),
            _ => s.max_candidates,
        };

        let existing = candidates_size(segments);
        segments.set_max_prediction_candidates_size(size.saturating_sub(existing));
        let mut result = self.history.predict_for_request(request, segments);

        let remaining = size.saturating_sub(candidates_size(segments));
        if remaining == 0 {
            return result;
        }
        segments.set_max_prediction_candidates_size(remaining);
        result |= self.dictionary.predict_for_request(request, segments);
        result
    }

    fn predict_mobile(&self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        let s = &settings().prediction;
        let zero_query = request.request.zero_query_suggestion
            && segments.conversion_segment(0).is_some_and(|seg| seg.key().is_empty());
        let (history_size, dictionary_size) = match segments.request_type() {
            RequestType::Suggestion if zero_query => (s.mobile_history_zero_query, s.mobile_suggestion_size),
            RequestType::Suggestion => (s.mobile_history_suggestion, s.mobile_suggestion_size),
            RequestType::Prediction if zero_query => (s.mobile_history_zero_query, s.mobile_prediction_size),
            RequestType::Prediction => (s.mobile_history_prediction, s.mobile_prediction_size),
            RequestType::PartialSuggestion => (0, s.mobile_suggestion_size),
            RequestType::PartialPrediction => (0, s.mobile_prediction_size),
            RequestType::Conversion | RequestType::ReverseConversion => return false,
        };

        let mut result = false;
        if history_size > 0 {
            segments.set_max_prediction_candidates_size(history_size);
            result |= self.history.predict_for_request(request, segments);
        }
        segments.set_max_prediction_candidates_size(dictionary_size);
        result |= self.dictionary.predict_for_request(request, segments);
        result
    }

    /// Give committed candidates without a key the reading of their value,
    /// so history can learn them. Values not ending in hiragana are left
    /// alone since their reading cannot be trusted.
    fn fill_missing_readings(&self, segments: &mut Segments) {
        let Some(converter) = &self.reverse_converter else {
            return;
        };
        for segment in segments.conversion_segments_mut() {
            let Some(top) = segment.candidate_mut(0) else {
                continue;
            };
            if !top.key.is_empty() || !top.value.chars().last().is_some_and(is_hiragana) {
                continue;
            }
            let Some(reading) = reverse_convert(converter.as_ref(), &top.value) else {
                tracing::debug!(value = %top.value, "no reading found");
                continue;
            };
            top.content_key = reading.clone();
            top.key = reading;
        }
    }
}

fn candidates_size(segments: &Segments) -> usize {
    segments
        .conversion_segment(0)
        .map_or(0, |s| s.candidates_size())
}

fn reverse_convert(converter: &dyn ImmutableConverter, value: &str) -> Option<String> {
    let mut segments = Segments::new();
    segments.add_segment().set_key(value);
    segments.set_request_type(RequestType::ReverseConversion);
    if !converter.convert(&mut segments) {
        return None;
    }
    let mut reading = String::new();
    for segment in segments.conversion_segments() {
        let top = segment.candidate(0)?;
        if top.value.is_empty() {
            return None;
        }
        reading.push_str(&top.value);
    }
    (!reading.is_empty()).then_some(reading)
}

impl Predictor for CompositePredictor {
    fn predict_for_request(&self, request: &ConversionRequest, segments: &mut Segments) -> bool {
        match self.policy {
            PredictorPolicy::Default => self.predict_default(request, segments),
            PredictorPolicy::Mobile => self.predict_mobile(request, segments),
        }
    }

    fn finish(&self, request: &ConversionRequest, segments: &mut Segments) {
        if self.policy == PredictorPolicy::Mobile {
            self.fill_missing_readings(segments);
        }
        self.history.finish(request, segments);
        self.dictionary.finish(request, segments);
    }

    fn revert(&self, segments: &mut Segments) {
        self.history.revert(segments);
    }

    fn clear_all_history(&self) -> bool {
        self.history.clear_all_history()
    }

    fn clear_unused_history(&self) -> bool {
        self.history.clear_unused_history()
    }

    fn clear_history_entry(&self, key: &str, value: &str) -> bool {
        self.history.clear_history_entry(key, value)
    }

    fn sync(&self) -> bool {
        self.history.sync()
    }

    fn reload(&self) -> bool {
        self.history.reload()
    }

    fn wait(&self) -> bool {
        self.history.wait()
    }

    fn name(&self) -> &str {
        match self.policy {
            PredictorPolicy::Default => "DefaultPredictor",
            PredictorPolicy::Mobile => "MobilePredictor",
        }
    }
}
