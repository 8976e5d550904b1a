use super::*;

use std::sync::Arc;

use crate::request::{ClientRequest, ConversionRequest};
use crate::segments::{Candidate, RequestType, SegmentType, Segments};
use crate::testutil::{FakeImmutableConverter, FixedPredictor};

struct Setup {
    predictor: CompositePredictor,
    history: Arc<FixedPredictor>,
    dictionary: Arc<FixedPredictor>,
}

fn setup(policy: PredictorPolicy, history_size: usize, dictionary_size: usize) -> Setup {
    let history = Arc::new(FixedPredictor::numbered("history", "き", history_size));
    let dictionary = Arc::new(FixedPredictor::numbered("dictionary", "き", dictionary_size));
    let predictor = CompositePredictor::new(history.clone(), dictionary.clone(), policy);
    Setup {
        predictor,
        history,
        dictionary,
    }
}

fn query(request_type: RequestType, key: &str) -> Segments {
    let mut segments = Segments::new();
    segments.set_request_type(request_type);
    segments.add_segment().set_key(key);
    segments
}

fn mobile_request() -> ConversionRequest {
    let mut request = ConversionRequest::new();
    request.request = ClientRequest {
        zero_query_suggestion: true,
        mixed_conversion: true,
        ..ClientRequest::default()
    };
    request
}

fn candidates_size(segments: &Segments) -> usize {
    segments.conversion_segment(0).unwrap().candidates_size()
}

#[test]
fn test_policy_for_client() {
    assert_eq!(PredictorPolicy::for_client(&ClientRequest::default()), PredictorPolicy::Default);
    assert_eq!(
        PredictorPolicy::for_client(&mobile_request().request),
        PredictorPolicy::Mobile
    );
    let half = ClientRequest {
        zero_query_suggestion: true,
        ..ClientRequest::default()
    };
    assert_eq!(PredictorPolicy::for_client(&half), PredictorPolicy::Default);
}

#[test]
fn test_default_suggestion_filled_by_history() {
    let s = setup(PredictorPolicy::Default, 5, 20);
    let mut segments = query(RequestType::Suggestion, "き");
    assert!(s.predictor.predict_for_request(&ConversionRequest::new(), &mut segments));

    assert_eq!(candidates_size(&segments), 3);
    assert_eq!(s.history.calls(), vec![(RequestType::Suggestion, 3)]);
    assert!(s.dictionary.calls().is_empty());
}

#[test]
fn test_default_prediction_shares_budget() {
    let s = setup(PredictorPolicy::Default, 5, 200);
    let mut segments = query(RequestType::Prediction, "き");
    assert!(s.predictor.predict_for_request(&ConversionRequest::new(), &mut segments));

    assert_eq!(candidates_size(&segments), 100);
    assert_eq!(s.history.calls(), vec![(RequestType::Prediction, 100)]);
    assert_eq!(s.dictionary.calls(), vec![(RequestType::Prediction, 95)]);
    let top = segments.conversion_segment(0).unwrap().candidate(0).unwrap();
    assert_eq!(top.value, "き0");
}

#[test]
fn test_default_counts_shown_candidates() {
    let s = setup(PredictorPolicy::Default, 0, 200);
    let mut segments = query(RequestType::Prediction, "き");
    let segment = segments.conversion_segment_mut(0).unwrap();
    segment.push_candidate(Candidate::new("き", "木"));
    segment.push_candidate(Candidate::new("き", "気"));

    s.predictor.predict_for_request(&ConversionRequest::new(), &mut segments);
    assert_eq!(s.history.calls(), vec![(RequestType::Prediction, 98)]);
    assert_eq!(s.dictionary.calls(), vec![(RequestType::Prediction, 98)]);
    assert_eq!(candidates_size(&segments), 100);
}

#[test]
fn test_default_suggestion_size_is_clamped() {
    let s = setup(PredictorPolicy::Default, 0, 20);
    let mut request = ConversionRequest::new();

    request.config.suggestions_size = 0;
    let mut segments = query(RequestType::Suggestion, "き");
    s.predictor.predict_for_request(&request, &mut segments);
    assert_eq!(candidates_size(&segments), 1);

    request.config.suggestions_size = 20;
    let mut segments = query(RequestType::Suggestion, "き");
    s.predictor.predict_for_request(&request, &mut segments);
    assert_eq!(candidates_size(&segments), 9);
}

#[test]
fn test_default_presentation_mode() {
    let s = setup(PredictorPolicy::Default, 5, 5);
    let mut request = ConversionRequest::new();
    request.config.presentation_mode = true;
    let mut segments = query(RequestType::Suggestion, "き");

    assert!(!s.predictor.predict_for_request(&request, &mut segments));
    assert!(s.history.calls().is_empty());
    assert!(s.dictionary.calls().is_empty());
}

#[test]
fn test_mobile_budgets() {
    let cases = [
        (RequestType::Suggestion, "き", Some(2), 20),
        (RequestType::Suggestion, "", Some(3), 20),
        (RequestType::Prediction, "き", Some(4), 200),
        (RequestType::Prediction, "", Some(3), 200),
        (RequestType::PartialSuggestion, "き", None, 20),
        (RequestType::PartialPrediction, "き", None, 200),
    ];
    for (request_type, key, history_budget, dictionary_budget) in cases {
        let s = setup(PredictorPolicy::Mobile, 10, 300);
        let mut segments = query(request_type, key);
        assert!(s.predictor.predict_for_request(&mobile_request(), &mut segments));

        let expected: Vec<_> = history_budget.map(|b| (request_type, b)).into_iter().collect();
        assert_eq!(s.history.calls(), expected, "{request_type:?} {key:?}");
        assert_eq!(
            s.dictionary.calls(),
            vec![(request_type, dictionary_budget)],
            "{request_type:?} {key:?}"
        );
        assert_eq!(
            candidates_size(&segments),
            history_budget.unwrap_or(0) + dictionary_budget
        );
    }
}

#[test]
fn test_mobile_ignores_conversion() {
    let s = setup(PredictorPolicy::Mobile, 5, 5);
    let mut segments = query(RequestType::Conversion, "き");
    assert!(!s.predictor.predict_for_request(&mobile_request(), &mut segments));
    assert!(s.dictionary.calls().is_empty());
}

#[test]
fn test_maintenance_goes_to_history() {
    let s = setup(PredictorPolicy::Default, 0, 0);
    let mut segments = Segments::new();
    s.predictor.revert(&mut segments);
    s.predictor.finish(&ConversionRequest::new(), &mut segments);

    assert_eq!(s.history.reverted(), 1);
    assert_eq!(s.dictionary.reverted(), 0);
    assert_eq!(s.history.finished(), 1);
    assert_eq!(s.dictionary.finished(), 1);
    assert_eq!(s.predictor.name(), "DefaultPredictor");
}

fn committed(values: &[&str]) -> Segments {
    let mut segments = Segments::new();
    for value in values {
        let segment = segments.add_segment();
        segment.set_key(*value);
        segment.set_segment_type(SegmentType::FixedValue);
        segment.push_candidate(Candidate::new("", *value));
    }
    segments
}

fn reading_converter() -> Arc<FakeImmutableConverter> {
    Arc::new(
        FakeImmutableConverter::new()
            .add("たべ", &["食べ"])
            .add("た", &["た"])
            .add("とうきょう", &["東京"]),
    )
}

#[test]
fn test_mobile_finish_fills_readings() {
    let s = setup(PredictorPolicy::Mobile, 0, 0);
    let predictor = CompositePredictor::new(s.history.clone(), s.dictionary.clone(), PredictorPolicy::Mobile)
        .with_reverse_converter(reading_converter());
    let mut segments = committed(&["食べた", "東京"]);
    predictor.finish(&mobile_request(), &mut segments);

    let eaten = segments.conversion_segment(0).unwrap().candidate(0).unwrap();
    assert_eq!(eaten.key, "たべた");
    assert_eq!(eaten.content_key, "たべた");
    // No trailing kana, so no trusted reading.
    let tokyo = segments.conversion_segment(1).unwrap().candidate(0).unwrap();
    assert_eq!(tokyo.key, "");
    assert_eq!(s.history.finished(), 1);
}

#[test]
fn test_default_finish_keeps_candidates() {
    let s = setup(PredictorPolicy::Default, 0, 0);
    let predictor = CompositePredictor::new(s.history.clone(), s.dictionary.clone(), PredictorPolicy::Default)
        .with_reverse_converter(reading_converter());
    let mut segments = committed(&["食べた"]);
    predictor.finish(&ConversionRequest::new(), &mut segments);
    assert_eq!(segments.conversion_segment(0).unwrap().candidate(0).unwrap().key, "");
}
