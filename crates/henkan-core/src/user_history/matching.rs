//! Key matching rules for history lookup.

use crate::request::KeyExpansion;
use crate::unicode::{char_len, script_type, script_type_of, ScriptType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    NoMatch,
    /// Left side is empty, right side is not.
    LeftEmptyMatch,
    /// Left side is a strict prefix of the right side.
    LeftPrefixMatch,
    /// Right side is a strict prefix of the left side.
    RightPrefixMatch,
    ExactMatch,
}

/// Byte-wise prefix relation between `lstr` and `rstr`.
pub fn get_match_type(lstr: &str, rstr: &str) -> MatchType {
    if lstr.is_empty() && !rstr.is_empty() {
        return MatchType::LeftEmptyMatch;
    }
    let size = lstr.len().min(rstr.len());
    if size == 0 {
        return MatchType::NoMatch;
    }
    if lstr.as_bytes()[..size] != rstr.as_bytes()[..size] {
        return MatchType::NoMatch;
    }
    match lstr.len().cmp(&rstr.len()) {
        std::cmp::Ordering::Equal => MatchType::ExactMatch,
        std::cmp::Ordering::Less => MatchType::LeftPrefixMatch,
        std::cmp::Ordering::Greater => MatchType::RightPrefixMatch,
    }
}

/// Match a stored key against the typed input, honoring an ambiguous tail.
///
/// Without expansion the composer's `key_base` is compared directly, since it
/// can differ from `input_key` after composer normalization. With expansion,
/// the part of `target` after `key_base` must start with one of the expanded
/// tails; the result is exact only when the reconstruction equals both
/// `target` and `input_key`.
pub fn get_match_type_from_input(
    input_key: &str,
    key_base: &str,
    key_expanded: Option<&KeyExpansion>,
    target: &str,
) -> MatchType {
    let Some(expanded) = key_expanded else {
        return get_match_type(key_base, target);
    };

    if key_base.is_empty() {
        return match expanded.longest_prefix_of(target) {
            None => MatchType::NoMatch,
            Some(value) if value == target && value == input_key => MatchType::ExactMatch,
            Some(_) => MatchType::LeftPrefixMatch,
        };
    }

    let size = key_base.len().min(target.len());
    if size == 0 || key_base.as_bytes()[..size] != target.as_bytes()[..size] {
        return MatchType::NoMatch;
    }
    if target.len() <= key_base.len() {
        return MatchType::RightPrefixMatch;
    }
    let Some(value) = expanded.longest_prefix_of(&target[key_base.len()..]) else {
        return MatchType::NoMatch;
    };
    let matched = format!("{key_base}{value}");
    if matched == target && matched == input_key {
        MatchType::ExactMatch
    } else {
        MatchType::LeftPrefixMatch
    }
}

/// Whether `prefix` is a prefix of `str` after undoing exactly one typo:
/// a dropped character, two swapped neighbours, or a non-alphanumeric
/// character typed where `str` has the prolonged-sound `-`.
///
/// An exact prefix is not a fuzzy match.
pub fn roman_fuzzy_prefix_match(str: &str, prefix: &str) -> bool {
    let s = str.as_bytes();
    let p = prefix.as_bytes();
    if p.is_empty() || p.len() > s.len() {
        return false;
    }

    let Some(i) = (0..p.len()).find(|&i| p[i] != s[i]) else {
        return false;
    };

    if s[i] == b'-' {
        if !p[i].is_ascii_alphanumeric() {
            let mut replaced = p.to_vec();
            replaced[i] = s[i];
            return s.starts_with(&replaced);
        }
        return false;
    }

    let mut inserted = p.to_vec();
    inserted.insert(i, s[i]);
    if s.starts_with(&inserted) {
        return true;
    }

    if i + 1 < p.len() {
        let mut swapped = p.to_vec();
        swapped.swap(i, i + 1);
        if s.starts_with(&swapped) {
            return true;
        }
    }
    false
}

/// Hiragana with exactly one stray Latin letter or one stray symbol, which
/// is what a single romaji typo leaves in the composition.
pub fn maybe_roman_misspelled_key(key: &str) -> bool {
    let mut num_alpha = 0;
    let mut num_hiragana = 0;
    let mut num_unknown = 0;
    for c in key.chars() {
        let t = script_type(c);
        if t == ScriptType::Hiragana || c == 'ー' {
            num_hiragana += 1;
            continue;
        }
        if t == ScriptType::Unknown && num_unknown == 0 {
            num_unknown += 1;
            continue;
        }
        if t == ScriptType::Alphabet && num_alpha == 0 {
            num_alpha += 1;
            continue;
        }
        return false;
    }
    num_hiragana > 0 && (num_alpha + num_unknown == 1)
}

pub fn is_punctuation(value: &str) -> bool {
    matches!(
        value,
        "。" | "." | "、" | "," | "？" | "?" | "！" | "!" | "，" | "．"
    )
}

/// Anything longer than one character, or a single character of a known
/// script, counts as a content word. Lone symbols do not.
pub fn is_content_word(value: &str) -> bool {
    char_len(value) > 1 || script_type_of(value) != ScriptType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expansion(base: &str, tails: &[&str]) -> KeyExpansion {
        KeyExpansion {
            base: base.to_string(),
            expanded: tails.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_get_match_type() {
        assert_eq!(get_match_type("test", ""), MatchType::NoMatch);
        assert_eq!(get_match_type("", ""), MatchType::NoMatch);
        assert_eq!(get_match_type("", "test"), MatchType::LeftEmptyMatch);
        assert_eq!(get_match_type("foo", "bar"), MatchType::NoMatch);
        assert_eq!(get_match_type("foo", "foo"), MatchType::ExactMatch);
        assert_eq!(get_match_type("foo", "foobar"), MatchType::LeftPrefixMatch);
        assert_eq!(get_match_type("foobar", "foo"), MatchType::RightPrefixMatch);
    }

    #[test]
    fn test_match_type_from_input_without_expansion() {
        assert_eq!(
            get_match_type_from_input("８，＋", "８、＋", None, "８、＋"),
            MatchType::ExactMatch
        );
    }

    #[test]
    fn test_match_type_from_input_roman_expansion() {
        // preedit "あｋ": base "あ", tails か き く け こ
        let exp = expansion("あ", &["か", "き", "く", "け", "こ"]);
        let m = |target| get_match_type_from_input("あｋ", "あ", Some(&exp), target);
        assert_eq!(m("あか"), MatchType::LeftPrefixMatch);
        assert_eq!(m("あき"), MatchType::LeftPrefixMatch);
        assert_eq!(m("あかい"), MatchType::LeftPrefixMatch);
        assert_eq!(m("あま"), MatchType::NoMatch);
        assert_eq!(m("あ"), MatchType::RightPrefixMatch);
        assert_eq!(m("い"), MatchType::NoMatch);
    }

    #[test]
    fn test_match_type_from_input_kana_expansion() {
        // preedit "あし": base "あ", tails し じ
        let exp = expansion("あ", &["し", "じ"]);
        let m = |target| get_match_type_from_input("あし", "あ", Some(&exp), target);
        assert_eq!(m("あし"), MatchType::ExactMatch);
        assert_eq!(m("あじ"), MatchType::LeftPrefixMatch);
        assert_eq!(m("あしかゆう"), MatchType::LeftPrefixMatch);
        assert_eq!(m("あじしゅう"), MatchType::LeftPrefixMatch);
        assert_eq!(m("うし"), MatchType::NoMatch);
    }

    #[test]
    fn test_match_type_from_input_empty_base() {
        let exp = expansion("", &["か", "が"]);
        let m = |target| get_match_type_from_input("か", "", Some(&exp), target);
        assert_eq!(m("か"), MatchType::ExactMatch);
        assert_eq!(m("がっこう"), MatchType::LeftPrefixMatch);
        assert_eq!(m("さ"), MatchType::NoMatch);
    }

    #[test]
    fn test_roman_fuzzy_prefix_match() {
        // identical or exact prefix
        assert!(!roman_fuzzy_prefix_match("abc", "abc"));
        assert!(!roman_fuzzy_prefix_match("a", "a"));
        assert!(!roman_fuzzy_prefix_match("abc", "a"));
        assert!(!roman_fuzzy_prefix_match("abc", "ab"));
        assert!(!roman_fuzzy_prefix_match("abc", ""));

        // swap
        assert!(roman_fuzzy_prefix_match("ab", "ba"));
        assert!(roman_fuzzy_prefix_match("abfoo", "bafoo"));
        assert!(roman_fuzzy_prefix_match("fooab", "fooba"));
        assert!(roman_fuzzy_prefix_match("fooabfoo", "foobafoo"));
        assert!(roman_fuzzy_prefix_match("fooabfoo", "fooba"));

        // deletion
        assert!(roman_fuzzy_prefix_match("abcd", "acd"));
        assert!(roman_fuzzy_prefix_match("abcd", "bcd"));
        assert!(roman_fuzzy_prefix_match("abcdf", "acd"));
        assert!(roman_fuzzy_prefix_match("abcdfoo", "bcd"));

        // prolonged sound mark
        assert!(roman_fuzzy_prefix_match("gu-guru", "gu^guru"));
        assert!(roman_fuzzy_prefix_match("gu-guru", "gu=guru"));
        assert!(roman_fuzzy_prefix_match("gu-guru", "gu^gu"));
        assert!(!roman_fuzzy_prefix_match("gu-guru", "gugu"));

        // invalid
        assert!(!roman_fuzzy_prefix_match("", ""));
        assert!(!roman_fuzzy_prefix_match("", "a"));
        assert!(!roman_fuzzy_prefix_match("abcde", "defe"));
    }

    #[test]
    fn test_maybe_roman_misspelled_key() {
        assert!(maybe_roman_misspelled_key("こんぴゅーｔ"));
        assert!(maybe_roman_misspelled_key("こんぴゅーt"));
        assert!(!maybe_roman_misspelled_key("こんぴゅーた"));
        assert!(maybe_roman_misspelled_key("ぱｓこん"));
        assert!(!maybe_roman_misspelled_key("ぱそこん"));
        assert!(maybe_roman_misspelled_key("おねがいしまうｓ"));
        assert!(!maybe_roman_misspelled_key("おねがいします"));
        assert!(maybe_roman_misspelled_key("いんた=ねっと"));
        assert!(!maybe_roman_misspelled_key("ｔ"));
        assert!(maybe_roman_misspelled_key("ーｔ"));
        // two letters, two symbols, or one of each
        assert!(!maybe_roman_misspelled_key("おｎがいしまうｓ"));
        assert!(!maybe_roman_misspelled_key("お＆がい＄しまう"));
        assert!(!maybe_roman_misspelled_key("お＆がいしまうｓ"));
    }

    #[test]
    fn test_is_punctuation() {
        for p in ["。", ".", "、", ",", "？", "?", "！", "!", "，", "．"] {
            assert!(is_punctuation(p), "{p}");
        }
        assert!(!is_punctuation("あ"));
        assert!(!is_punctuation("。。"));
    }

    #[test]
    fn test_is_content_word() {
        assert!(is_content_word("今日"));
        assert!(is_content_word("あ"));
        assert!(is_content_word("a"));
        assert!(!is_content_word("、"));
        assert!(!is_content_word("!"));
    }
}
