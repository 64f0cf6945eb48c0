//! Provider adapter for text-generation APIs
//!
//! Maps a logical provider name to its endpoint, auth headers, request body
//! shape, and response-extraction rule, then normalizes the heterogeneous
//! API shapes into a single `{content, usage}` result.
//!
//! # Architecture
//!
//! - [`profile`] - Declarative per-provider descriptor table
//! - [`client`] - One generic executor over the table, with rate limiting
//!   and bounded polling for asynchronous providers
//! - [`placeholder`] - Prompt token substitution
//! - [`error`] - Provider error taxonomy

pub mod client;
pub mod error;
pub mod placeholder;
pub mod profile;

pub use client::ProviderClient;
pub use error::ProviderError;
pub use placeholder::{process as process_placeholders, PlaceholderContext};
pub use profile::{lookup, AuthStyle, CompletionMode, ProviderProfile, RequestShape, PROFILES};
