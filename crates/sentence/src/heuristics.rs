use std::sync::LazyLock;

use regex::Regex;

/// Characters that close a sentence, including full-width CJK forms.
pub const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

static TRAILING_STOP_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:and|or|the|a|an|to|of|in|at|for|with|that|which|who)\s*$")
        .expect("stop word pattern is valid")
});

pub fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(SENTENCE_TERMINATORS)
}

/// True when `text` obviously stops mid-sentence: no terminator, and it ends
/// with a connective or article, or with a comma.
///
/// Abbreviations that end in a period ("Dr.") are treated as complete.
pub fn is_incomplete(text: &str) -> bool {
    let text = text.trim_end();
    if text.is_empty() || ends_sentence(text) {
        return false;
    }
    text.ends_with(',') || TRAILING_STOP_WORD.is_match(text)
}

pub fn starts_with_lowercase(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
}

pub fn is_continuation(previous: &str, next: &str) -> bool {
    is_incomplete(previous) || starts_with_lowercase(next)
}

pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_incomplete() {
        assert!(is_incomplete("I love Tom and"));
        assert!(is_incomplete("this is THE"));
        assert!(is_incomplete("which brings us to   "));
        assert!(is_incomplete("well,"));
        assert!(!is_incomplete("I love Tom."));
        assert!(!is_incomplete("we saw a band"));
        assert!(!is_incomplete("Hamburg"));
        assert!(!is_incomplete(""));
    }

    #[test]
    fn test_starts_with_lowercase() {
        assert!(starts_with_lowercase("  and then"));
        assert!(!starts_with_lowercase("And then"));
        assert!(!starts_with_lowercase("élan"));
        assert!(!starts_with_lowercase("123"));
        assert!(!starts_with_lowercase(""));
    }
}
