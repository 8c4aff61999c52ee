//! Word tokenization and n-gram expansion

use once_cell::sync::Lazy;
use regex::Regex;

fn word_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\w+").expect("Valid word token regex"));
    &PATTERN
}

/// Settings that shape how text is split into terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerSettings {
    pub ngram_max: usize,
    pub min_token_len: usize,
}

/// Lowercased word tokens, dropping those shorter than `min_token_len` chars
pub fn words(text: &str, min_token_len: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| token.chars().count() >= min_token_len)
        .map(str::to_string)
        .collect()
}

/// All terms of a text: unigrams followed by n-grams up to `ngram_max`
///
/// N-grams are the space-joined words, so `"reset my password"` with
/// `ngram_max = 2` yields `reset, my, password, reset my, my password`.
pub fn terms(text: &str, settings: TokenizerSettings) -> Vec<String> {
    let tokens = words(text, settings.min_token_len);
    let mut out = tokens.clone();
    for n in 2..=settings.ngram_max {
        if tokens.len() < n {
            break;
        }
        out.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    out
}
