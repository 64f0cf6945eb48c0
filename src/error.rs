//! Unified error handling
//!
//! Consolidates the domain-specific error types into a single `Error` enum
//! for use at module boundaries and in the CLI, while each subsystem keeps
//! its own error type internally.
//!
//! # Architecture
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::provider::ProviderError;
pub use crate::publisher::PublishError;
pub use crate::scheduler::SchedulerError;
pub use crate::storage::StoreError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Text-generation provider errors
    Provider,
    /// Storage and I/O errors
    Storage,
    /// Publishing errors
    Publishing,
    /// Scheduler and timing errors
    Scheduler,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

/// Unified error type
#[derive(Error, Debug)]
pub enum Error {
    /// Text-generation provider errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Job store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Publishing errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Scheduler and dispatch errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is recoverable (a retry could succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_recoverable(),
            Self::Publish(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Store(_) => false,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Http(_) => true,
            Self::Config(_) => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Provider(_) => ErrorCategory::Provider,
            Self::Store(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Publish(_) => ErrorCategory::Publishing,
            Self::Scheduler(e) => match e {
                SchedulerError::Provider(_) => ErrorCategory::Provider,
                SchedulerError::Publish(_) => ErrorCategory::Publishing,
                SchedulerError::Store(_) => ErrorCategory::Storage,
                SchedulerError::InvalidSchedule(_) => ErrorCategory::Scheduler,
            },
            Self::Json(_) => ErrorCategory::Other,
            Self::Http(_) => ErrorCategory::Network,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
