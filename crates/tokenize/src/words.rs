use std::sync::OnceLock;

use regex::Regex;

#[allow(clippy::expect_used)]
fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{M}\p{N}\s]+").expect("static punctuation pattern"))
}

#[allow(clippy::expect_used)]
fn sentence_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?;\n]+").expect("static sentence pattern"))
}

/// Split a string into words on whitespace and ASCII punctuation.
pub fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

/// Lowercase `text`, drop apostrophes, replace remaining punctuation with
/// spaces and collapse runs of whitespace.
///
/// `"Don't panic, it's 1985!"` becomes `"dont panic its 1985"`.
pub fn clean_text(text: &str) -> String {
    let lower = text.to_lowercase().replace(['\'', '\u{2019}'], "");
    let stripped = punctuation().replace_all(&lower, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split raw text into cleaned, tokenized sentences.
///
/// Sentences end at `.`, `!`, `?`, `;` or a newline. Sentences that are empty
/// after cleaning are dropped; single-word sentences are kept.
pub fn split_sentences(text: &str) -> Vec<Vec<String>> {
    sentence_break()
        .split(text)
        .map(|raw| tokenize(&clean_text(raw)))
        .filter(|words| !words.is_empty())
        .collect()
}
