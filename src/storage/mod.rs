//! Durable state: job records, one-shot flags, and run leases
//!
//! Storage follows a repository pattern: business logic depends on the
//! [`JobStore`] trait, with a SQLite implementation for production and an
//! in-memory SQLite database for tests.

pub mod jobs;

use thiserror::Error;

pub use jobs::{JobStore, SqliteJobStore};

/// Errors raised by the storage layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A status transition was attempted from an unexpected prior status
    #[error("Job {id} is not in status '{expected}'")]
    InvalidTransition { id: String, expected: &'static str },

    /// Job id not present in the store
    #[error("Job {0} not found")]
    NotFound(String),

    /// Stored value could not be interpreted
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Result type alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
