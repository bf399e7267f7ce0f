use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9']+").expect("valid token regex"));

/// Lower-cases the input and extracts maximal `[a-z0-9']+` runs as a set.
/// Token presence, not frequency, is the classifier feature, so duplicates
/// collapse here.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    TOKEN_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_non_word_runs() {
        let tokens = tokenize("Rust 1.0 — don't panic!");
        let expected: Vec<&str> = vec!["0", "1", "don't", "panic", "rust"];
        assert_eq!(tokens.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn repeated_words_collapse_to_one_token() {
        assert_eq!(tokenize("spam spam spam"), tokenize("spam"));
    }

    #[test]
    fn deterministic_across_calls() {
        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(tokenize(text), tokenize(text));
    }

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("!!! ---").is_empty());
    }
}
