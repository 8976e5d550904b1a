//! Conversion and prediction core for a Japanese input method.
//!
//! [`segments`] holds the mutable conversion document, [`converter`] drives
//! every client operation over it, [`prediction`] composes the learned
//! history with an external dictionary predictor, and [`user_history`]
//! learns from committed conversions.

pub mod converter;
pub mod dict;
pub mod prediction;
pub mod request;
pub mod romaji;
pub mod segments;
pub mod settings;
pub mod unicode;
pub mod user_history;

#[cfg(test)]
pub(crate) mod testutil;
