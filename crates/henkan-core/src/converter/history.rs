//! Left context for the next conversion.

use crate::segments::{Attributes, Candidate, SegmentType, Segments};
use crate::unicode::{full_width_ascii_to_half_width, script_type, ScriptType};

use super::{Converter, ConverterError};

/// Trailing run of `text` sharing one script type.
///
/// A single trailing space is skipped; two end the search with `None`, as
/// does an empty `text`. The run never extends across a space.
pub fn extract_last_token_with_script_type(text: &str) -> Option<(String, ScriptType)> {
    let mut chars = text.chars().rev().peekable();
    if chars.peek() == Some(&' ') {
        chars.next();
        if chars.peek() == Some(&' ') {
            return None;
        }
    }
    let script = script_type(*chars.peek()?);

    let mut token: Vec<char> = chars
        .take_while(|&c| c != ' ' && script_type(c) == script)
        .collect();
    token.reverse();
    Some((token.into_iter().collect(), script))
}

/// Half-width form of `s` if it consists of digits and arithmetic
/// operators only. Full-width and Japanese variants (`＋`, `ー`, `×`, `÷`,
/// `・`, ...) are folded to ASCII.
pub fn normalize_math_expression(s: &str) -> Option<String> {
    if s.is_empty() {
        return None;
    }
    s.chars()
        .map(|c| match c {
            '0'..='9' => Some(c),
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32),
            '+' | '＋' => Some('+'),
            '-' | 'ー' => Some('-'),
            '*' | '＊' | '×' => Some('*'),
            '/' | '／' | '・' | '÷' => Some('/'),
            '(' | '（' => Some('('),
            ')' | '）' => Some(')'),
            '=' | '＝' => Some('='),
            _ => None,
        })
        .collect()
}

impl Converter {
    /// Key, value and part-of-speech id of the trailing number or word of
    /// `preceding_text`. Other scripts do not connect.
    fn last_connective_part(&self, preceding_text: &str) -> Option<(String, String, u16)> {
        let (token, script) = extract_last_token_with_script_type(preceding_text)?;
        let id = match script {
            ScriptType::Number => self.pos_ids.number,
            ScriptType::Alphabet => self.pos_ids.unique_noun,
            _ => return None,
        };
        Some((full_width_ascii_to_half_width(&token), token, id))
    }

    /// Replace `segments` with one history segment built from the text
    /// preceding the caret, so that e.g. counters after "3" rank well.
    pub fn reconstruct_history(&self, segments: &mut Segments, preceding_text: &str) -> Result<(), ConverterError> {
        segments.clear();
        let Some((key, value, id)) = self.last_connective_part(preceding_text) else {
            tracing::debug!(preceding_text, "no connective part");
            return Err(ConverterError::NoHistoryContext);
        };

        let segment = segments.add_segment();
        segment.set_key(key.as_str());
        segment.set_segment_type(SegmentType::History);
        let mut candidate = Candidate::new(key, value);
        candidate.lid = id;
        candidate.rid = id;
        candidate.attributes = Attributes::NO_LEARNING;
        segment.push_candidate(candidate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> Option<(String, ScriptType)> {
        extract_last_token_with_script_type(text)
    }

    #[test]
    fn test_last_token() {
        assert_eq!(token("展望台2"), Some(("2".into(), ScriptType::Number)));
        assert_eq!(token("hello world"), Some(("world".into(), ScriptType::Alphabet)));
        assert_eq!(token("abc123"), Some(("123".into(), ScriptType::Number)));
        assert_eq!(token("ｍｏｚｃ"), Some(("ｍｏｚｃ".into(), ScriptType::Alphabet)));
    }

    #[test]
    fn test_last_token_spaces() {
        assert_eq!(token("mozc "), Some(("mozc".into(), ScriptType::Alphabet)));
        assert_eq!(token("mozc  "), None);
        assert_eq!(token(" "), None);
        assert_eq!(token(""), None);
    }

    #[test]
    fn test_math_expression() {
        assert_eq!(normalize_math_expression("365*24="), Some("365*24=".into()));
        assert_eq!(normalize_math_expression("３６５×２４＝"), Some("365*24=".into()));
        assert_eq!(normalize_math_expression("（１ー２）÷３"), Some("(1-2)/3".into()));
        assert_eq!(normalize_math_expression("1・2"), Some("1/2".into()));
        assert_eq!(normalize_math_expression("1+a"), None);
        assert_eq!(normalize_math_expression("かんじ"), None);
        assert_eq!(normalize_math_expression(""), None);
    }
}
