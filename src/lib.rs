//! postgen - Scheduled AI blog-post generation and publishing
//!
//! Generates blog posts through pluggable text-generation providers,
//! normalizes the output, and publishes it to WordPress on a schedule with
//! daily quotas, a posting window, and optional backdated posting history.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and validation
//! - [`provider`] - Text-generation provider adapter with rate limiting
//! - [`parser`] - Normalization of raw generation output
//! - [`storage`] - SQLite-backed job store with claims, flags, and leases
//! - [`scheduler`] - Posting window, backdate planner, and job dispatcher
//! - [`publisher`] - Draft assembly, SEO meta strategies, WordPress REST
//! - [`images`] - Best-effort featured-image resolution
//! - [`commands`] - Operator-facing operations behind the CLI
//!
//! # Example
//!
//! ```no_run
//! use postgen::config::Config;
//! use postgen::storage::SqliteJobStore;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!     let store = SqliteJobStore::open(&config.database.path)?;
//!     // commands::schedule_single(&store, &config, None, None)?;
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod images;
pub mod models;
pub mod parser;
pub mod provider;
pub mod publisher;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{GenerationJob, JobStatus, NormalizedContent};
    pub use crate::provider::ProviderClient;
    pub use crate::publisher::{Publisher, WordPressPublisher};
    pub use crate::scheduler::{Dispatcher, RunOutcome};
    pub use crate::storage::{JobStore, SqliteJobStore};
}

// Direct re-exports for convenience
pub use models::{GenerationJob, JobStatus, NormalizedContent};
