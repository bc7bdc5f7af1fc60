//! Text tokenization for the news vectorizer.

use regex::Regex;
use std::sync::LazyLock;

/// Word tokens: two or more word characters.
static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Case-insensitive tokenizer emitting unigrams and, optionally, adjacent
/// bigrams (two words joined by a single space).
#[derive(Debug, Clone)]
pub struct Tokenizer {
    ngram_max: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self { ngram_max: 1 }
    }

    /// Emit bigrams in addition to unigrams.
    pub fn with_bigrams(mut self) -> Self {
        self.ngram_max = 2;
        self
    }

    /// Tokenize text into lowercase terms.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = TOKEN_REGEX.find_iter(&lower).map(|m| m.as_str()).collect();

        let mut terms: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        if self.ngram_max >= 2 {
            for pair in words.windows(2) {
                terms.push(format!("{} {}", pair[0], pair[1]));
            }
        }
        terms
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}
