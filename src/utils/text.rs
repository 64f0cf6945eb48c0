//! Plain-text helpers shared by the parser and content statistics
//!
//! The heuristics here are deliberately simple: markup stripping is a tag
//! regex, sentences split on periods, and syllables are approximated by
//! vowel-group counting.

use std::sync::OnceLock;

use regex::Regex;

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

fn markdown_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[#*_`\[\]]").expect("valid markdown regex"))
}

/// Strip HTML tags and markdown punctuation, collapsing runs of whitespace
pub fn strip_markup(text: &str) -> String {
    let without_tags = tag_re().replace_all(text, " ");
    let without_markdown = markdown_re().replace_all(&without_tags, "");
    without_markdown.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into sentences on periods, dropping empty fragments
pub fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split('.').map(str::trim).filter(|s| !s.is_empty())
}

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Approximate syllable count by counting vowel groups per word
///
/// Every word contributes at least one syllable.
pub fn syllable_count(text: &str) -> usize {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut groups = 0usize;
            let mut in_group = false;
            for c in word.chars() {
                let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u');
                if vowel && !in_group {
                    groups += 1;
                }
                in_group = vowel;
            }
            groups.max(1)
        })
        .sum()
}
