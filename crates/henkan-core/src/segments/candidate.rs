use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitset of candidate attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Attributes(u32);

impl Attributes {
    pub const NONE: Self = Self(0);
    /// Promoted to the top by the user.
    pub const RERANKED: Self = Self(1 << 0);
    /// Consumes only `consumed_key_size` characters of the segment key.
    pub const PARTIALLY_KEY_CONSUMED: Self = Self(1 << 1);
    pub const SPELLING_CORRECTION: Self = Self(1 << 2);
    pub const TYPING_CORRECTION: Self = Self(1 << 3);
    pub const AUTO_PARTIAL_SUGGESTION: Self = Self(1 << 4);
    pub const NO_LEARNING: Self = Self(1 << 5);
    pub const NO_SUGGEST_LEARNING: Self = Self(1 << 6);
    pub const USER_HISTORY_PREDICTION: Self = Self(1 << 7);
    pub const NO_VARIANTS_EXPANSION: Self = Self(1 << 8);
    pub const NO_EXTRA_DESCRIPTION: Self = Self(1 << 9);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for Attributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Attributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One conversion result for a segment.
///
/// `content_key`/`content_value` are the leading part of `key`/`value` without
/// trailing function words; `cost`, `lid` and `rid` belong to the language
/// model and are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub value: String,
    pub content_key: String,
    pub content_value: String,
    /// Characters of the segment key this candidate consumes, when
    /// `PARTIALLY_KEY_CONSUMED` is set.
    pub consumed_key_size: usize,
    pub description: String,
    pub cost: i32,
    pub wcost: i32,
    pub structure_cost: i32,
    pub lid: u16,
    pub rid: u16,
    pub attributes: Attributes,
    /// (key chars, value chars) of each inner word, when the candidate
    /// spans several words that should be learned separately.
    pub inner_segment_boundary: Vec<(usize, usize)>,
}

impl Candidate {
    /// A candidate whose content part covers the whole key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        Self {
            content_key: key.clone(),
            content_value: value.clone(),
            key,
            value,
            ..Self::default()
        }
    }

    pub fn functional_key(&self) -> &str {
        self.key.strip_prefix(self.content_key.as_str()).unwrap_or("")
    }

    pub fn functional_value(&self) -> &str {
        self.value
            .strip_prefix(self.content_value.as_str())
            .unwrap_or("")
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} (content {}:{}) cost={} lid={} rid={} attr={:#x}",
            self.key,
            self.value,
            self.content_key,
            self.content_value,
            self.cost,
            self.lid,
            self.rid,
            self.attributes.bits()
        )
    }
}
