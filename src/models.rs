//! Core data structures shared across the pipeline
//!
//! This module defines the job record tracked by the store, the normalized
//! content record produced by the parser, and the small value types passed
//! between the dispatcher, publisher, and image resolver.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a scheduled generation job
///
/// Transitions are forward-only: `Pending -> Processing -> Completed | Failed`.
/// A terminal state is never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// String form used in the database and log output
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether this status is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled request to generate and publish one document
///
/// Created by a scheduling request (single or bulk) and mutated exclusively
/// by the dispatcher during processing. Exactly one of `result_document_id`
/// and `error_detail` is populated once the status is terminal; neither is
/// populated while the job is pending or processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Opaque identifier, assigned at creation
    pub id: Uuid,

    /// Free-text instruction; may embed placeholder tokens like `{topic}`
    pub prompt: String,

    /// Target local timestamp for execution
    pub schedule_at: NaiveDateTime,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Identifier of the published document, set only on `Completed`
    pub result_document_id: Option<String>,

    /// Captured error message, set only on `Failed`
    pub error_detail: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Local>,

    /// Set once, at the terminal transition
    pub processed_at: Option<DateTime<Local>>,
}

/// Raw generation result returned by a provider
#[derive(Debug, Clone)]
pub struct GeneratedText {
    /// The generated text, before normalization
    pub content: String,

    /// Provider-reported token usage, when present in the response
    pub usage: Option<serde_json::Value>,
}

/// Canonical post-generation record consumed by the publisher
///
/// Every field carries a fallback-generation rule in the parser, so a
/// `NormalizedContent` is always fully populated. A missing field signals
/// that the generation attempt failed entirely, never a partial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContent {
    /// Post title, non-empty
    pub title: String,

    /// Formatted body text
    pub body: String,

    /// Search snippet, at most ~155 characters
    pub meta_description: String,

    /// Up to five unique short tags, in vocabulary order
    pub tags: Vec<String>,

    /// Primary SEO target term, derived from tags when not explicit
    pub focus_keyword: String,

    /// Category name, present only when the provider returned one explicitly
    pub category: Option<String>,
}

/// Featured-image metadata returned by an image resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub alt_text: String,
    pub credit: String,
}

/// Derived content metrics recorded as generation provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStats {
    pub word_count: usize,
    pub character_count: usize,
    pub paragraph_count: usize,
    /// Flesch-Reading-Ease-style score, clamped to 0..=100
    pub readability_score: u32,
}
