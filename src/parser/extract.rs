//! Per-field fallback extractors for prose responses
//!
//! Each extractor is seeded with the full raw text and produces a best-effort
//! value; none of them can fail. They are invoked field-by-field when the
//! provider response is not JSON, or when a JSON response omits a field.

use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;

use crate::utils::text;

/// Fixed tag vocabulary, matched case-insensitively against the full text
///
/// Matches are kept in vocabulary order, capped at five unique entries.
pub const TAG_VOCABULARY: &[&str] = &[
    "AI",
    "artificial intelligence",
    "machine learning",
    "technology",
    "innovation",
    "business",
    "marketing",
    "digital",
    "online",
    "strategy",
    "growth",
    "trends",
    "development",
    "software",
    "automation",
    "productivity",
    "success",
];

/// Keyword used when no vocabulary term matches
pub const DEFAULT_FOCUS_KEYWORD: &str = "technology";

const TITLE_MIN: usize = 10;
const TITLE_MAX: usize = 100;
const SENTENCE_TITLE_MIN: usize = 20;
const SENTENCE_TITLE_MAX: usize = 80;
const DESCRIPTION_BUDGET: usize = 150;
const DESCRIPTION_HARD_CAP: usize = 155;

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#+\s*(.+)$").expect("valid heading regex"))
}

fn title_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^Title:\s*(.+)$").expect("valid title-line regex"))
}

fn leading_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^(#+\s*.+|Title:\s*.+)\n").expect("valid regex"))
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// Extract a title from raw text
///
/// Tries, in order: a markdown heading, a `Title:`-prefixed line, the literal
/// first line — accepting the first candidate of length 10..=100. Falls back
/// to a sentence of length 20..=80, then a timestamp-stamped generic title.
pub fn title(raw: &str) -> String {
    let heading = heading_re()
        .captures(raw)
        .map(|c| c[1].trim().to_string());
    let title_line = title_line_re()
        .captures(raw)
        .map(|c| c[1].trim().to_string());
    let first_line = raw.lines().next().map(|l| l.trim().to_string());

    for candidate in [heading, title_line, first_line].into_iter().flatten() {
        let len = candidate.chars().count();
        if len > TITLE_MIN && len < TITLE_MAX {
            return candidate;
        }
    }

    for sentence in text::sentences(raw) {
        let len = sentence.chars().count();
        if len > SENTENCE_TITLE_MIN && len < SENTENCE_TITLE_MAX {
            return sentence.to_string();
        }
    }

    format!("AI Generated Post - {}", Local::now().format("%b %-d, %Y"))
}

/// Build a meta description by accumulating whole sentences under the budget
///
/// Falls back to the first 155 raw characters plus an ellipsis when no
/// sentence fits.
pub fn meta_description(raw: &str) -> String {
    let clean = text::strip_markup(raw);

    let mut description = String::new();
    for sentence in text::sentences(&clean) {
        if description.chars().count() + sentence.chars().count() >= DESCRIPTION_BUDGET {
            break;
        }
        description.push_str(sentence);
        description.push_str(". ");
    }

    let description = description.trim().to_string();
    if !description.is_empty() {
        return description;
    }

    let prefix: String = clean.chars().take(DESCRIPTION_HARD_CAP).collect();
    if prefix.is_empty() {
        prefix
    } else {
        format!("{prefix}...")
    }
}

/// Match the fixed vocabulary against the text, case-insensitively
pub fn tags(raw: &str) -> Vec<String> {
    let lower = raw.to_lowercase();
    let mut found = Vec::new();

    for term in TAG_VOCABULARY {
        if lower.contains(&term.to_lowercase()) && !found.iter().any(|t| t == term) {
            found.push(term.to_string());
            if found.len() == 5 {
                break;
            }
        }
    }

    found
}

/// First extracted tag, or the fixed default
pub fn focus_keyword(extracted_tags: &[String]) -> String {
    extracted_tags
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_FOCUS_KEYWORD.to_string())
}

/// Clean a prose body: strip a leading title-like line and collapse runs of
/// three or more newlines to one blank line
pub fn body(raw: &str) -> String {
    let without_title = leading_title_re().replace(raw, "");
    blank_run_re()
        .replace_all(&without_title, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_markdown_heading() {
        let raw = "# The Rise of Automation\n\nBody text here.";
        assert_eq!(title(raw), "The Rise of Automation");
    }

    #[test]
    fn test_title_from_title_line() {
        let raw = "Title: Remote Work Strategies\nSome body.";
        assert_eq!(title(raw), "Remote Work Strategies");
    }

    #[test]
    fn test_title_from_first_line() {
        let raw = "Cloud storage keeps evolving\nmore text follows here";
        assert_eq!(title(raw), "Cloud storage keeps evolving");
    }

    #[test]
    fn test_title_rejects_short_first_line() {
        // First line too short, falls through to sentence scan
        let raw = "Short.\nThe quick brown fox jumped over a lazy sleeping dog. More.";
        assert_eq!(title(raw), "The quick brown fox jumped over a lazy sleeping dog");
    }

    #[test]
    fn test_title_generic_fallback() {
        let generated = title("");
        assert!(generated.starts_with("AI Generated Post - "));
    }

    #[test]
    fn test_meta_description_accumulates_sentences() {
        let raw = "First sentence here. Second sentence follows. Third one.";
        let desc = meta_description(raw);
        assert!(desc.starts_with("First sentence here."));
        assert!(desc.chars().count() <= 155);
    }

    #[test]
    fn test_meta_description_truncation_fallback() {
        // One long run with no period under the budget
        let raw = "x".repeat(400);
        let desc = meta_description(&raw);
        assert!(desc.ends_with("..."));
        assert_eq!(desc.chars().count(), 155 + 3);
    }

    #[test]
    fn test_meta_description_empty_input() {
        assert_eq!(meta_description(""), "");
    }

    #[test]
    fn test_tags_vocabulary_order_and_cap() {
        let raw = "Success in business needs strategy, marketing, automation, \
                   productivity and technology.";
        let found = tags(raw);
        assert_eq!(found.len(), 5);
        // Vocabulary order, not occurrence order
        assert_eq!(found[0], "technology");
        assert_eq!(found[1], "business");
    }

    #[test]
    fn test_tags_case_insensitive() {
        let found = tags("MACHINE LEARNING is everywhere");
        assert!(found.contains(&"machine learning".to_string()));
    }

    #[test]
    fn test_focus_keyword_default() {
        assert_eq!(focus_keyword(&[]), "technology");
        assert_eq!(focus_keyword(&["growth".to_string()]), "growth");
    }

    #[test]
    fn test_body_strips_title_and_collapses_newlines() {
        let raw = "# My Title\nFirst paragraph.\n\n\n\nSecond paragraph.";
        let cleaned = body(raw);
        assert!(!cleaned.contains("My Title"));
        assert_eq!(cleaned, "First paragraph.\n\nSecond paragraph.");
    }
}
