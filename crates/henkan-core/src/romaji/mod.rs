//! Kana-to-romaji conversion.
//!
//! Romanized readings let the history predictor forgive a single mistyped
//! key: "yorsiku" still finds よろしく.

mod table;

pub use table::KanaTable;

use crate::unicode::full_width_ascii_to_half_width;

/// Romanize hiragana in `s` with the global table. Characters without a
/// mapping pass through, full-width ASCII folded to half-width.
pub fn to_roman(s: &str) -> String {
    to_roman_with(KanaTable::global(), s)
}

pub fn to_roman_with(table: &KanaTable, s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        if c == 'っ' {
            let after = &rest[c.len_utf8()..];
            if let Some(consonant) = doubled_consonant(table, after) {
                out.push(consonant);
                rest = after;
                continue;
            }
        }
        match table.longest_match(rest) {
            Some((romaji, used)) => {
                out.push_str(romaji);
                rest = &rest[used..];
            }
            None => {
                out.push_str(&full_width_ascii_to_half_width(&rest[..c.len_utf8()]));
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// Sokuon doubles the first consonant of the following kana.
fn doubled_consonant(table: &KanaTable, after: &str) -> Option<char> {
    let (romaji, _) = table.longest_match(after)?;
    let first = romaji.chars().next()?;
    if first.is_ascii_alphabetic() && !matches!(first, 'a' | 'i' | 'u' | 'e' | 'o' | 'x') {
        Some(first)
    } else {
        None
    }
}
