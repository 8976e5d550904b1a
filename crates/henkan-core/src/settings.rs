//! Global tunables loaded from TOML.
//!
//! The embedded `default_settings.toml` is used unless [`init_custom`] runs
//! before the first [`settings`] call. Both are checked by `build.rs` or on
//! load, so [`settings`] cannot fail at runtime.
//!
//! Per-user switches (incognito, history suggest, ...) are not here; they travel
//! with each request in [`crate::request::Config`].

use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Replace the defaults. Must run before anything reads [`settings`].
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Process-wide settings, parsed on first use.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub history: HistorySettings,
    pub prediction: PredictionSettings,
    pub converter: ConverterSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    /// Capacity of the LRU history cache.
    pub cache_size: usize,
    /// Maximum outgoing chain links per entry.
    pub max_next_entries: usize,
    /// Keys, values and descriptions longer than this (bytes) are not learned.
    pub max_string_length: usize,
    /// Cache entries scanned per suggestion lookup.
    pub max_suggestion_trial: usize,
    /// Cache entries scanned when recovering the previous entry by suffix.
    pub max_prev_value_trial: usize,
    pub punctuation_merge_window_secs: u64,
    pub chain_expansion_window_secs: u64,
    pub bigram_boost_secs: u64,
    pub long_candidate_chars: usize,
    /// Lookup stops after `results_multiplier * max_prediction_candidates_size` hits.
    pub results_multiplier: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionSettings {
    pub max_candidates: usize,
    pub max_suggestions: usize,
    pub mobile_suggestion_size: usize,
    pub mobile_prediction_size: usize,
    pub mobile_history_suggestion: usize,
    pub mobile_history_prediction: usize,
    pub mobile_history_zero_query: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterSettings {
    pub max_history_segments: usize,
    pub complete_pos_start: usize,
    pub complete_pos_step: usize,
    pub complete_pos_max: usize,
    pub general_noun_id: u16,
    pub number_id: u16,
    pub unique_noun_id: u16,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings =
        toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive!(history.cache_size);
    check_positive!(history.max_next_entries);
    check_positive!(history.max_string_length);
    check_positive!(history.max_suggestion_trial);
    check_positive!(history.max_prev_value_trial);
    check_positive!(history.results_multiplier);

    check_positive!(prediction.max_candidates);
    check_positive!(prediction.max_suggestions);
    check_positive!(prediction.mobile_suggestion_size);
    check_positive!(prediction.mobile_prediction_size);

    check_positive!(converter.complete_pos_start);
    check_positive!(converter.complete_pos_step);
    check_positive!(converter.general_noun_id);
    check_positive!(converter.number_id);
    check_positive!(converter.unique_noun_id);

    if s.converter.complete_pos_start >= s.converter.complete_pos_max {
        return Err(SettingsError::InvalidValue {
            field: "converter.complete_pos_start".to_string(),
            reason: "must be below converter.complete_pos_max".to_string(),
        });
    }

    Ok(())
}
