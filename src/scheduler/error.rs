//! Scheduler error types

use thiserror::Error;

use crate::provider::ProviderError;
use crate::publisher::PublishError;
use crate::storage::StoreError;

/// Errors raised while planning or dispatching jobs
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Job store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Text generation failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Publishing the finished draft failed
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Invalid schedule parameters
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

impl SchedulerError {
    /// Whether retrying the same job later could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            SchedulerError::Provider(e) => e.is_recoverable(),
            SchedulerError::Publish(e) => e.is_recoverable(),
            SchedulerError::Store(_) | SchedulerError::InvalidSchedule(_) => false,
        }
    }
}
