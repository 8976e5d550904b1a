//! Prediction sources and their composition.
//!
//! A [`Predictor`] fills the first conversion segment with candidates for a
//! prediction-family request. [`CompositePredictor`] merges the learned
//! history with an external dictionary predictor under per-mode budgets.

mod composite;

#[cfg(test)]
mod tests;

pub use composite::{CompositePredictor, PredictorPolicy};

use crate::request::ConversionRequest;
use crate::segments::Segments;

/// Common surface of every prediction source.
///
/// Maintenance operations default to no-ops so that stateless sources only
/// implement lookup.
pub trait Predictor: Send + Sync {
    /// Append at most `segments.max_prediction_candidates_size()` new
    /// candidates to the first conversion segment. Candidates already there
    /// are kept. Returns whether any were added.
    fn predict_for_request(&self, request: &ConversionRequest, segments: &mut Segments) -> bool;

    /// Learn from a committed conversion.
    fn finish(&self, _request: &ConversionRequest, _segments: &mut Segments) {}

    /// Undo what the last `finish` on `segments` learned.
    fn revert(&self, _segments: &mut Segments) {}

    fn clear_all_history(&self) -> bool {
        true
    }

    fn clear_unused_history(&self) -> bool {
        true
    }

    fn clear_history_entry(&self, _key: &str, _value: &str) -> bool {
        false
    }

    /// Persist learned state in the background.
    fn sync(&self) -> bool {
        true
    }

    /// Reload learned state in the background.
    fn reload(&self) -> bool {
        true
    }

    /// Block until background persistence has finished.
    fn wait(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}
