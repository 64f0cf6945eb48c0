//! Content statistics and readability scoring

use crate::models::ContentStats;
use crate::utils::text;

/// Compute word, character, and paragraph counts plus a readability score
/// for a post body
pub fn compute(body: &str) -> ContentStats {
    let paragraph_count = body
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .count();

    ContentStats {
        word_count: text::word_count(body),
        character_count: body.chars().count(),
        paragraph_count,
        readability_score: readability(body),
    }
}

/// Flesch-Reading-Ease-style score, clamped to 0..=100
///
/// `206.835 - 1.015 * (words/sentences) - 84.6 * (syllables/words)`, with
/// syllables approximated by vowel-group counting. Empty text scores zero.
pub fn readability(body: &str) -> u32 {
    let clean = text::strip_markup(body);
    let sentences: Vec<&str> = text::sentences(&clean).collect();
    let words: Vec<&str> = clean.split_whitespace().collect();

    if sentences.is_empty() || words.is_empty() {
        return 0;
    }

    let syllables: usize = words.iter().map(|w| text::syllable_count(w)).sum();

    let asl = words.len() as f64 / sentences.len() as f64;
    let aspw = syllables as f64 / words.len() as f64;

    let score = 206.835 - 1.015 * asl - 84.6 * aspw;
    score.clamp(0.0, 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let stats = compute("One two three.\n\nFour five.");
        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.paragraph_count, 2);
        assert!(stats.character_count > 0);
    }

    #[test]
    fn test_empty_body() {
        let stats = compute("");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.paragraph_count, 0);
        assert_eq!(stats.readability_score, 0);
    }

    #[test]
    fn test_simple_text_scores_high() {
        // Short words in short sentences read easily
        let score = readability("The cat sat. The dog ran. We all had fun.");
        assert!(score > 80, "score was {score}");
    }

    #[test]
    fn test_dense_text_scores_lower() {
        let simple = readability("The cat sat. The dog ran.");
        let dense = readability(
            "Organizational interoperability necessitates comprehensive \
             infrastructural reconfiguration initiatives across heterogeneous \
             technological environments administered internationally.",
        );
        assert!(dense < simple);
    }

    #[test]
    fn test_score_clamped() {
        let score = readability("A. B. C.");
        assert!(score <= 100);
    }
}
