//! Conversions learned by a real history predictor.

use super::*;
use crate::dict::{SuppressionList, WordList};
use crate::prediction::{CompositePredictor, PredictorPolicy};
use crate::testutil::{test_lattice, values, FixedPredictor};
use crate::user_history::{MemoryStorage, UserHistoryPredictor};

fn learning_converter() -> (Converter, Arc<UserHistoryPredictor>) {
    let suppression = Arc::new(SuppressionList::new());
    let history = Arc::new(UserHistoryPredictor::new(
        Arc::new(WordList::new()),
        suppression.clone(),
        Arc::new(MemoryStorage::new()),
    ));
    history.wait();
    let dictionary = Arc::new(FixedPredictor::new("dictionary", &[("きょうは", "今日は")]));
    let predictor = CompositePredictor::new(history.clone(), dictionary, PredictorPolicy::Default);
    let converter = Converter::new(
        Arc::new(predictor),
        Arc::new(NoopRewriter),
        Arc::new(test_lattice()),
        suppression,
    );
    (converter, history)
}

fn commit_all(converter: &Converter, key: &str) -> Segments {
    let mut segments = Segments::new();
    converter.start_conversion(&mut segments, key).unwrap();
    for i in 0..segments.conversion_segments_size() {
        converter.commit_segment_value(&mut segments, i, 0).unwrap();
    }
    converter
        .finish_conversion(&ConversionRequest::new(), &mut segments)
        .unwrap();
    segments
}

#[test]
fn test_committed_value_is_predicted() {
    let (converter, history) = learning_converter();
    commit_all(&converter, "きょうと");
    assert!(history.lookup("きょうと", "京都").is_some());

    let mut segments = Segments::new();
    converter.start_prediction(&mut segments, "きょ").unwrap();
    assert!(values(&segments, 0).contains(&"京都".to_string()));
    assert!(values(&segments, 0).contains(&"今日は".to_string()));
}

#[test]
fn test_revert_forgets_last_commit() {
    let (converter, history) = learning_converter();
    let mut segments = commit_all(&converter, "きょうと");
    assert!(!segments.revert_entries().is_empty());

    converter.revert_conversion(&mut segments).unwrap();
    assert!(history.lookup("きょうと", "京都").is_none());

    let mut segments = Segments::new();
    assert_eq!(
        converter.start_prediction(&mut segments, "きょうと"),
        Err(ConverterError::NoCandidates)
    );
}

#[test]
fn test_multi_segment_commit_chains() {
    let (converter, _history) = learning_converter();
    commit_all(&converter, "わたしは");

    let mut segments = Segments::new();
    converter.start_prediction(&mut segments, "わたしは").unwrap();
    assert!(values(&segments, 0).contains(&"私は".to_string()));
}

#[test]
fn test_clear_history_through_converter() {
    let (converter, history) = learning_converter();
    commit_all(&converter, "きょうと");
    assert!(converter.predictor().clear_history_entry("きょうと", "京都"));
    assert!(history.lookup("きょうと", "京都").map_or(true, |e| e.removed));
}

#[test]
fn test_repeated_prediction_keeps_values_unique() {
    let (converter, _history) = learning_converter();
    commit_all(&converter, "きょうと");

    let mut segments = Segments::new();
    converter.start_prediction(&mut segments, "きょ").unwrap();
    let first = values(&segments, 0);
    converter.start_prediction(&mut segments, "きょ").unwrap();
    let second = values(&segments, 0);

    assert_eq!(second, first);
    let mut unique = second.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), second.len());
}
