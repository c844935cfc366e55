//! Hangul helpers for Korean duplicate detection.
//!
//! Suffix stripping is a regex heuristic tuned on common verb endings and
//! particles, not a morphological analyzer. It misfires on nouns that happen
//! to end in a particle syllable (고양이 -> 고양).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Longer endings first: alternation is leftmost-first.
    static ref SUFFIX_RE: Regex = Regex::new(concat!(
        "(",
        // past tense
        "았습니다|었습니다|했습니다|았어요|었어요|였어요|했어요|았어|었어|했어|았다|었다|였다|했다|",
        // sentence-final and dictionary endings
        "습니다|니다|어요|아요|해요|하다|요|다|",
        // nominal suffix
        "하기|기|",
        // object / subject / topic particles
        "을|를|이|가|은|는",
        ")$"
    ))
    .expect("valid Korean suffix regex");
}

/// True if the text contains at least one precomposed Hangul syllable.
pub fn contains_hangul(s: &str) -> bool {
    s.chars().any(is_hangul_syllable)
}

pub fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Remove one trailing verb ending or particle.
pub fn strip_suffixes(s: &str) -> &str {
    match SUFFIX_RE.find(s) {
        Some(m) => &s[..m.start()],
        None => s,
    }
}

/// The trailing ending or particle, if the text has one.
pub fn suffix_of(s: &str) -> Option<&str> {
    SUFFIX_RE.find(s).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_hangul() {
        assert!(contains_hangul("먹다"));
        assert!(contains_hangul("to eat (먹다)"));
        assert!(!contains_hangul("to eat"));
        // compatibility jamo alone are not syllables
        assert!(!contains_hangul("ㅋㅋ"));
    }

    #[test]
    fn test_strip_past_tense() {
        assert_eq!(strip_suffixes("먹었어요"), "먹");
        assert_eq!(strip_suffixes("갔다"), "갔");
        assert_eq!(strip_suffixes("공부했어요"), "공부");
        assert_eq!(strip_suffixes("먹었습니다"), "먹");
    }

    #[test]
    fn test_strip_dictionary_and_polite_forms() {
        assert_eq!(strip_suffixes("먹다"), "먹");
        assert_eq!(strip_suffixes("공부하다"), "공부");
        assert_eq!(strip_suffixes("공부해요"), "공부");
        assert_eq!(strip_suffixes("있어요"), "있");
    }

    #[test]
    fn test_strip_nominal_and_particles() {
        assert_eq!(strip_suffixes("공부하기"), "공부");
        assert_eq!(strip_suffixes("사과를"), "사과");
        assert_eq!(strip_suffixes("학생은"), "학생");
    }

    #[test]
    fn test_strip_leaves_other_text() {
        assert_eq!(strip_suffixes("사과"), "사과");
        assert_eq!(strip_suffixes("hello"), "hello");
        assert_eq!(strip_suffixes(""), "");
    }

    #[test]
    fn test_suffix_of() {
        assert_eq!(suffix_of("먹었어요"), Some("었어요"));
        assert_eq!(suffix_of("맛있다"), Some("다"));
        assert_eq!(suffix_of("사과"), None);
    }
}
