//! Prompt placeholder substitution
//!
//! Replaces the bracketed tokens `{topic}`, `{date}`, `{keyword}`,
//! `{category}`, and `{author}` with caller-supplied or environment-derived
//! values. Substitution is literal string replacement, order-independent,
//! and case-sensitive on the tokens.

use chrono::Local;
use rand::seq::SliceRandom;

/// Fallback topics drawn when the caller supplies none
const FALLBACK_TOPICS: &[&str] = &[
    "Latest Technology Trends",
    "Digital Marketing Strategies for Small Businesses",
    "The Future of Remote Work",
    "Sustainable Business Practices",
    "Cybersecurity Best Practices",
    "Social Media Marketing Tips",
    "E-commerce Growth Strategies",
    "Productivity Tools and Techniques",
    "Customer Experience Optimization",
    "Data Analytics for Business Growth",
];

/// Default keyword used when no topic is available for `{keyword}`
const DEFAULT_KEYWORD: &str = "technology trends";

/// Values substituted into a prompt template
#[derive(Debug, Clone)]
pub struct PlaceholderContext {
    /// Topic for `{topic}` and `{keyword}`; a random fallback topic is drawn
    /// when absent
    pub topic: Option<String>,

    /// Default category name for `{category}`
    pub category: String,

    /// Acting identity for `{author}`
    pub author: String,
}

impl Default for PlaceholderContext {
    fn default() -> Self {
        Self {
            topic: None,
            category: "Uncategorized".to_string(),
            author: "postgen".to_string(),
        }
    }
}

impl PlaceholderContext {
    /// Context with an explicit topic
    pub fn with_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }
}

/// Pick a random fallback topic
pub fn random_topic() -> &'static str {
    let mut rng = rand::thread_rng();
    FALLBACK_TOPICS
        .choose(&mut rng)
        .copied()
        .unwrap_or(FALLBACK_TOPICS[0])
}

/// Substitute all placeholder tokens in a prompt
///
/// Returns the processed prompt and the topic that was used, so callers can
/// reuse the topic for image search even when it was drawn at random.
pub fn process(prompt: &str, ctx: &PlaceholderContext) -> (String, String) {
    let topic = ctx
        .topic
        .clone()
        .unwrap_or_else(|| random_topic().to_string());

    let keyword = ctx
        .topic
        .clone()
        .unwrap_or_else(|| DEFAULT_KEYWORD.to_string());

    let date = Local::now().format("%B %-d, %Y").to_string();

    let processed = prompt
        .replace("{topic}", &topic)
        .replace("{date}", &date)
        .replace("{keyword}", &keyword)
        .replace("{category}", &ctx.category)
        .replace("{author}", &ctx.author);

    (processed, topic)
}
