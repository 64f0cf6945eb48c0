//! Error types for provider invocations

use thiserror::Error;

/// Errors that can occur while invoking a text-generation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Provider name is not in the profile table
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    /// Provider returned a non-success HTTP status with a decodable error body
    #[error("Provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Asynchronous provider reported an explicit failure status
    #[error("Provider reported failure: {0}")]
    Failed(String),

    /// Polling for an asynchronous result exhausted its attempt budget
    #[error("Provider polling timed out")]
    Timeout,

    /// Response shape did not match the expected extraction path
    #[error("Unable to extract content from provider response at '{path}'")]
    Unparseable { path: String },

    /// Network-level failure before a response was obtained
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local fixed-window request counter exhausted
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API key missing from configuration
    #[error("API key not configured")]
    MissingApiKey,
}

impl ProviderError {
    /// Whether a later attempt could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RateLimited | Self::Timeout
        )
    }
}
