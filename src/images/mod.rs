//! Featured-image resolution
//!
//! Image sourcing is strictly best-effort: a resolver failure or an empty
//! result degrades to publishing without an image, never to a failed job.
//! Three strategies exist, selected by name: keyword search on Unsplash or
//! Pexels, and prompt-based generation via DALL-E.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::ImageConfig;
use crate::models::ImageRef;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Image generation is slower than photo search
const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/v1/search";
const DALLE_GENERATE_URL: &str = "https://api.openai.com/v1/images/generations";

/// Best-effort featured-image source
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Resolve an image for a post; `None` means publish without
    ///
    /// Search-backed strategies query by `keyword`; the generation strategy
    /// and alt text use the parsed post `title`.
    async fn resolve(&self, keyword: &str, title: &str) -> Option<ImageRef>;
}

/// HTTP-backed resolver for the supported image services
pub struct HttpImageResolver {
    client: Client,
    api: String,
    api_key: String,

    /// Test override replacing the scheme and host of every service URL
    base_url: Option<String>,
}

impl HttpImageResolver {
    pub fn new(config: &ImageConfig) -> Option<Self> {
        if !config.enabled || config.api_key.is_empty() {
            return None;
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build().ok()?;
        Some(Self {
            client,
            api: config.api.clone(),
            api_key: config.api_key.clone(),
            base_url: None,
        })
    }

    /// Create a resolver pointed at a mock server
    pub fn with_base_url(config: &ImageConfig, base_url: &str) -> Option<Self> {
        let mut resolver = Self::new(config)?;
        resolver.base_url = Some(base_url.trim_end_matches('/').to_string());
        Some(resolver)
    }

    fn resolve_url(&self, endpoint: &str) -> String {
        match &self.base_url {
            Some(base) => {
                let path = endpoint
                    .find("://")
                    .and_then(|i| endpoint[i + 3..].find('/').map(|j| &endpoint[i + 3 + j..]))
                    .unwrap_or("/");
                format!("{base}{path}")
            }
            None => endpoint.to_string(),
        }
    }

    async fn unsplash(&self, keyword: &str, alt_text: &str) -> Option<ImageRef> {
        let payload: Value = self
            .client
            .get(self.resolve_url(UNSPLASH_SEARCH_URL))
            .header("Authorization", format!("Client-ID {}", self.api_key))
            .query(&[("query", keyword), ("per_page", "1")])
            .send()
            .await
            .ok()?
            .json()
            .await
            .ok()?;

        let first = payload.get("results")?.get(0)?;
        let url = first.get("urls")?.get("regular")?.as_str()?.to_string();
        let credit = first
            .get("user")
            .and_then(|u| u.get("name"))
            .and_then(Value::as_str)
            .map(|name| format!("Photo by {name} on Unsplash"))
            .unwrap_or_else(|| "Unsplash".to_string());

        Some(ImageRef {
            url,
            alt_text: alt_text.to_string(),
            credit,
        })
    }

    async fn pexels(&self, keyword: &str, alt_text: &str) -> Option<ImageRef> {
        let payload: Value = self
            .client
            .get(self.resolve_url(PEXELS_SEARCH_URL))
            .header("Authorization", &self.api_key)
            .query(&[("query", keyword), ("per_page", "1")])
            .send()
            .await
            .ok()?
            .json()
            .await
            .ok()?;

        let first = payload.get("photos")?.get(0)?;
        let url = first.get("src")?.get("large")?.as_str()?.to_string();
        let credit = first
            .get("photographer")
            .and_then(Value::as_str)
            .map(|name| format!("Photo by {name} on Pexels"))
            .unwrap_or_else(|| "Pexels".to_string());

        Some(ImageRef {
            url,
            alt_text: alt_text.to_string(),
            credit,
        })
    }

    async fn dalle(&self, subject: &str) -> Option<ImageRef> {
        let body = json!({
            "model": "dall-e-3",
            "prompt": format!("A professional, modern illustration representing: {subject}"),
            "n": 1,
            "size": "1024x1024",
        });

        let payload: Value = self
            .client
            .post(self.resolve_url(DALLE_GENERATE_URL))
            .timeout(GENERATION_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .ok()?
            .json()
            .await
            .ok()?;

        let url = payload.get("data")?.get(0)?.get("url")?.as_str()?.to_string();

        Some(ImageRef {
            url,
            alt_text: subject.to_string(),
            credit: "Generated with DALL-E".to_string(),
        })
    }
}

#[async_trait]
impl ImageResolver for HttpImageResolver {
    async fn resolve(&self, keyword: &str, title: &str) -> Option<ImageRef> {
        // The parsed title is the better image subject; the keyword backs
        // it up when the title is empty
        let subject = if title.is_empty() { keyword } else { title };

        let result = match self.api.as_str() {
            "unsplash" => self.unsplash(keyword, subject).await,
            "pexels" => self.pexels(keyword, subject).await,
            "dall-e" => self.dalle(subject).await,
            other => {
                tracing::warn!(api = %other, "Unknown image api, skipping image");
                None
            }
        };

        if result.is_none() {
            tracing::warn!(api = %self.api, keyword, "No image resolved, publishing without");
        }
        result
    }
}
