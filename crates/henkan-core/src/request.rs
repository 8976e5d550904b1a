//! Per-call request context.
//!
//! Everything that can change between two calls (user config, client
//! capabilities, composer state) is carried here instead of living in
//! process-wide state.

use std::collections::BTreeSet;
use std::ops::BitOr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PreeditMethod {
    #[default]
    Roman,
    Kana,
}

/// User configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nothing is learned or persisted while set.
    pub incognito_mode: bool,
    pub use_history_suggest: bool,
    /// Disables every suggestion, e.g. while presenting slides.
    pub presentation_mode: bool,
    /// Suggestion window size requested by the user (clamped to 1..=9).
    pub suggestions_size: usize,
    pub preedit_method: PreeditMethod,
    /// Let the history predictor use the composer's ambiguity expansion.
    pub enable_expansion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            incognito_mode: false,
            use_history_suggest: true,
            presentation_mode: false,
            suggestions_size: 3,
            preedit_method: PreeditMethod::Roman,
            enable_expansion: false,
        }
    }
}

/// Emoji carriers a client can render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EmojiCarrier(u32);

impl EmojiCarrier {
    pub const NONE: Self = Self(0);
    pub const UNICODE: Self = Self(1 << 0);
    pub const DOCOMO: Self = Self(1 << 1);
    pub const SOFTBANK: Self = Self(1 << 2);
    pub const KDDI: Self = Self(1 << 3);
    /// Carriers whose emoji use the Android private use area.
    pub const ANDROID: Self = Self(Self::DOCOMO.0 | Self::SOFTBANK.0 | Self::KDDI.0);

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for EmojiCarrier {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Client capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientRequest {
    pub zero_query_suggestion: bool,
    pub mixed_conversion: bool,
    pub available_emoji_carrier: EmojiCarrier,
}

impl ClientRequest {
    /// Mobile clients show zero-query suggestions mixed with conversion results.
    pub fn is_mobile(&self) -> bool {
        self.zero_query_suggestion && self.mixed_conversion
    }
}

/// Ambiguous tail of the composition, e.g. "あｋ" → base "あ", expanded {か, き, く, け, こ}.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyExpansion {
    pub base: String,
    pub expanded: BTreeSet<String>,
}

impl KeyExpansion {
    /// Longest expansion that `target` starts with.
    pub fn longest_prefix_of(&self, target: &str) -> Option<&str> {
        self.expanded
            .iter()
            .filter(|e| !e.is_empty() && target.starts_with(e.as_str()))
            .max_by_key(|e| e.len())
            .map(|e| e.as_str())
    }
}

/// Query strings derived from the composer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerState {
    pub conversion_query: String,
    pub prediction_query: String,
    pub preedit: String,
    /// Cursor position in characters.
    pub cursor: usize,
    /// Composition length in characters.
    pub length: usize,
    pub expansion: Option<KeyExpansion>,
}

impl ComposerState {
    /// A settled composition of `reading` with the cursor at the end.
    pub fn new(reading: &str) -> Self {
        let length = reading.chars().count();
        Self {
            conversion_query: reading.to_string(),
            prediction_query: reading.to_string(),
            preedit: reading.to_string(),
            cursor: length,
            length,
            expansion: None,
        }
    }

    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor.min(self.length);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeySelection {
    #[default]
    Conversion,
    Prediction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionRequest {
    pub config: Config,
    pub request: ClientRequest,
    pub composer: Option<ComposerState>,
    /// Which composer query `start_conversion_for_request` converts.
    pub key_selection: KeySelection,
}

impl ConversionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_composer(composer: ComposerState) -> Self {
        Self {
            composer: Some(composer),
            ..Self::default()
        }
    }

    pub fn has_composer(&self) -> bool {
        self.composer.is_some()
    }
}
