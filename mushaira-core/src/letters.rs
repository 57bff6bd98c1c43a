//! Persian letter handling for the linking rule.
//!
//! A verse must begin with the letter its predecessor ended on. Bare alef
//! and alef-with-madda stand for the same sound in this game and compare
//! equal. Diacritics, tatweel, zero-width joiners and punctuation are not
//! letters and are skipped when looking for the first or last letter.

/// Bare alef (ا).
pub const ALEF: char = '\u{0627}';

/// Alef with madda above (آ).
pub const ALEF_MADDA: char = '\u{0622}';

const TATWEEL: char = '\u{0640}';

/// Fold a letter to the representative used for comparisons.
pub fn normalize(letter: char) -> char {
    match letter {
        ALEF_MADDA => ALEF,
        other => other,
    }
}

/// Whether two letters satisfy the linking rule for each other.
pub fn letters_match(a: char, b: char) -> bool {
    normalize(a) == normalize(b)
}

/// First letter of a verse, ignoring leading punctuation and marks.
pub fn first_letter(text: &str) -> Option<char> {
    text.chars().find(|&c| is_letter(c))
}

/// Last letter of a verse, ignoring trailing punctuation and marks.
pub fn last_letter(text: &str) -> Option<char> {
    text.chars().rev().find(|&c| is_letter(c))
}

/// Check a verse against the required letter.
///
/// With no constraint every verse that has a letter at all passes.
pub fn starts_with_letter(verse: &str, required: Option<char>) -> bool {
    match (first_letter(verse), required) {
        (Some(first), Some(required)) => letters_match(first, required),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Read a single letter out of an oracle-supplied field such as `"«ز»"`.
pub fn parse_letter(field: &str) -> Option<char> {
    first_letter(field)
}

fn is_letter(c: char) -> bool {
    c.is_alphabetic() && c != TATWEEL && !is_arabic_mark(c)
}

/// Harakat, tanwin, superscript alef and the other combining marks of the
/// Arabic block. Some of these carry the Alphabetic property.
fn is_arabic_mark(c: char) -> bool {
    matches!(c,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06ED}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alef_variants_are_equivalent() {
        assert!(letters_match(ALEF, ALEF_MADDA));
        assert!(letters_match(ALEF_MADDA, ALEF));
        assert!(letters_match('ز', 'ز'));
        assert!(!letters_match('ز', 'ر'));
    }

    #[test]
    fn test_first_and_last_letter() {
        assert_eq!(first_letter("زبان فارسی زیباست"), Some('ز'));
        assert_eq!(last_letter("زبان فارسی زیباست"), Some('ت'));
        assert_eq!(first_letter("  «آسمان بار امانت نتوانست کشید»"), Some('آ'));
        assert_eq!(last_letter("آسمان بار امانت نتوانست کشید»."), Some('د'));
    }

    #[test]
    fn test_marks_and_joiners_are_skipped() {
        // Trailing kasra, tatweel and ZWNJ.
        assert_eq!(last_letter("دلِ\u{0640}\u{200C}"), Some('ل'));
        assert_eq!(first_letter("\u{064E}\u{200C}من"), Some('م'));
    }

    #[test]
    fn test_no_letters() {
        assert_eq!(first_letter(""), None);
        assert_eq!(first_letter("  ... ۱۲۳ !"), None);
        assert!(!starts_with_letter("۱۲۳", None));
    }

    #[test]
    fn test_starts_with_letter_uses_equivalence() {
        assert!(starts_with_letter("آمد بهار", Some(ALEF)));
        assert!(starts_with_letter("از دل برود", Some(ALEF_MADDA)));
        assert!(!starts_with_letter("بیا", Some(ALEF)));
        assert!(starts_with_letter("بیا", None));
    }

    #[test]
    fn test_parse_letter() {
        assert_eq!(parse_letter("«ز»"), Some('ز'));
        assert_eq!(parse_letter(" د "), Some('د'));
        assert_eq!(parse_letter("?"), None);
    }
}
