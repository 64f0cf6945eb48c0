//! Publishing interface and draft assembly
//!
//! The dispatcher hands a normalized content record to a [`Publisher`]
//! without knowing where it goes. Draft assembly — default category,
//! publish-vs-draft status, SEO meta fields, provenance stats — happens
//! here so every publisher backend receives the same finished draft.

pub mod seo;
pub mod stats;
pub mod wordpress;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::PublishConfig;
use crate::models::{ContentStats, ImageRef, NormalizedContent};

pub use wordpress::WordPressPublisher;

/// Errors raised while publishing a draft
#[derive(Error, Debug)]
pub enum PublishError {
    /// Network-level failure reaching the publishing target
    #[error("Publish transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The target rejected the request
    #[error("Publish rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The target's response could not be interpreted
    #[error("Unexpected publish response: {0}")]
    Unparseable(String),
}

impl PublishError {
    /// Whether retrying the same draft later could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            PublishError::Transport(_) => true,
            PublishError::Rejected { status, .. } => *status == 429 || *status >= 500,
            PublishError::Unparseable(_) => false,
        }
    }
}

/// Identifier of a published document, opaque to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId(pub String);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully assembled draft, ready for any publisher backend
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,

    /// Publish immediately when true, otherwise leave as a draft
    pub publish: bool,

    /// Post date override; backdated jobs carry their scheduled instant so
    /// the published history reads organically
    pub date: Option<NaiveDateTime>,

    /// Featured image, when one was resolved
    pub image: Option<ImageRef>,

    /// Plugin-specific SEO fields plus provenance stats
    pub meta: Map<String, Value>,
}

/// Destination-agnostic publishing seam
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one draft; returns the created document's id
    async fn publish(&self, draft: &PostDraft) -> Result<DocumentId, PublishError>;
}

/// Assemble a draft from normalized content and publish settings
///
/// The configured default category applies only when the content carries
/// none of its own. Stats are computed here so they describe exactly the
/// body being published.
pub fn assemble(
    content: &NormalizedContent,
    config: &PublishConfig,
    image: Option<ImageRef>,
    date: Option<NaiveDateTime>,
) -> PostDraft {
    let content_stats = stats::compute(&content.body);

    let category = content
        .category
        .clone()
        .unwrap_or_else(|| config.default_category.clone());

    let mut meta = seo::meta_fields(&config.seo_plugin, content);
    append_provenance(&mut meta, &content_stats);

    PostDraft {
        title: content.title.clone(),
        body: content.body.clone(),
        excerpt: content.meta_description.clone(),
        category,
        tags: content.tags.clone(),
        publish: config.auto_publish,
        date,
        image,
        meta,
    }
}

fn append_provenance(meta: &mut Map<String, Value>, stats: &ContentStats) {
    meta.insert(
        "_postgen_version".into(),
        env!("CARGO_PKG_VERSION").into(),
    );
    meta.insert(
        "_postgen_generated_at".into(),
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string().into(),
    );
    meta.insert("_postgen_word_count".into(), stats.word_count.into());
    meta.insert(
        "_postgen_character_count".into(),
        stats.character_count.into(),
    );
    meta.insert(
        "_postgen_paragraph_count".into(),
        stats.paragraph_count.into(),
    );
    meta.insert(
        "_postgen_readability".into(),
        stats.readability_score.into(),
    );
}
