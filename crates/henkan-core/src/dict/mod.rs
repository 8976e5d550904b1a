//! Dictionary interfaces consumed by the converter and the history predictor.
//!
//! The system dictionary itself lives outside this crate; only the narrow
//! lookups needed here are modeled. `WordList` and `SuppressionList` are small
//! in-memory implementations for hosts and tools without a full dictionary.

mod composite;
mod suppression;
mod word_list;

pub use composite::CompositeDictionary;
pub use suppression::SuppressionList;
pub use word_list::WordList;

/// Surface-form membership lookup.
pub trait Dictionary: Send + Sync {
    fn has_value(&self, value: &str) -> bool;
}

/// Words the user asked never to see.
pub trait SuppressionDictionary: Send + Sync {
    fn suppress_entry(&self, key: &str, value: &str) -> bool;
    fn is_empty(&self) -> bool;
}
