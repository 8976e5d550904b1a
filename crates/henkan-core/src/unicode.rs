//! Character-level Unicode classification for Japanese text.

/// Check the full Hiragana block (U+3040..U+309F). This includes a few unassigned
/// codepoints (U+3040, U+3097-3098) but these never appear in IME input or
/// dictionary readings.
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the Katakana block (U+30A0..U+30FF), the phonetic extensions and
/// half-width katakana.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
        || ('\u{31F0}'..='\u{31FF}').contains(&c)
        || ('\u{FF66}'..='\u{FF9F}').contains(&c)
}

pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
        || c == '々'
}

/// ASCII and full-width Latin letters.
pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
        || ('\u{FF21}'..='\u{FF3A}').contains(&c)
        || ('\u{FF41}'..='\u{FF5A}').contains(&c)
}

/// ASCII and full-width digits.
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('\u{FF10}'..='\u{FF19}').contains(&c)
}

/// Android carrier emoji live in Supplementary Private Use Area-B.
pub fn is_android_pua_emoji(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| ('\u{FE000}'..='\u{FEEA0}').contains(&c))
}

fn is_emoji(c: char) -> bool {
    ('\u{FE000}'..='\u{FEEA0}').contains(&c) || ('\u{1F300}'..='\u{1FAFF}').contains(&c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptType {
    Hiragana,
    Katakana,
    Kanji,
    Number,
    Alphabet,
    Emoji,
    Unknown,
}

pub fn script_type(c: char) -> ScriptType {
    if is_hiragana(c) {
        ScriptType::Hiragana
    } else if is_katakana(c) {
        ScriptType::Katakana
    } else if is_kanji(c) {
        ScriptType::Kanji
    } else if is_digit(c) {
        ScriptType::Number
    } else if is_latin(c) {
        ScriptType::Alphabet
    } else if is_emoji(c) {
        ScriptType::Emoji
    } else {
        ScriptType::Unknown
    }
}

/// Script type shared by every character of `s`, or `Unknown` when the
/// string is empty or mixes scripts.
///
/// The prolonged sound mark ー, the middle dot ・ and the voicing marks
/// continue a preceding kana run instead of breaking it.
pub fn script_type_of(s: &str) -> ScriptType {
    let mut result: Option<ScriptType> = None;
    for c in s.chars() {
        let is_kana_modifier = matches!(c, 'ー' | '・' | '\u{3099}'..='\u{309C}');
        if is_kana_modifier
            && matches!(result, Some(ScriptType::Hiragana) | Some(ScriptType::Katakana))
        {
            continue;
        }
        let t = script_type(c);
        match result {
            None => result = Some(t),
            Some(prev) if prev != t => return ScriptType::Unknown,
            Some(_) => {}
        }
    }
    result.unwrap_or(ScriptType::Unknown)
}

pub fn contains_script(s: &str, script: ScriptType) -> bool {
    s.chars().any(|c| script_type(c) == script)
}

/// `HELLO` or `Hello`. Used to normalize English words before a dictionary
/// lookup, since dictionaries store them lower-cased.
pub fn is_upper_or_capitalized_ascii(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_uppercase() {
        return false;
    }
    let rest = chars.as_str();
    rest.chars().all(|c| c.is_ascii_lowercase()) || rest.chars().all(|c| c.is_ascii_uppercase())
}

/// Convert full-width ASCII variants (U+FF01..U+FF5E) and the ideographic
/// space to their half-width forms. Other characters pass through unchanged.
pub fn full_width_ascii_to_half_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}

/// First `len` characters of `s` starting at character `start`.
pub fn char_substring(s: &str, start: usize, len: usize) -> &str {
    let begin = s.char_indices().nth(start).map_or(s.len(), |(i, _)| i);
    let rest = &s[begin..];
    let end = rest.char_indices().nth(len).map_or(rest.len(), |(i, _)| i);
    &rest[..end]
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
