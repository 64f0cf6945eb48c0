//! WordPress REST API publisher
//!
//! Talks to a WordPress site over `wp-json/wp/v2` using application-password
//! auth. Category and tag names are resolved to term ids before post
//! creation, creating missing terms on the fly. A featured image, when
//! present, is sideloaded into the media library first.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{DocumentId, PostDraft, PublishError, Publisher};
use crate::config::PublishConfig;
use crate::models::ImageRef;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Publisher backed by the WordPress REST API
pub struct WordPressPublisher {
    client: Client,
    base_url: String,
    user: String,
    app_password: String,
}

impl WordPressPublisher {
    /// Build a publisher from publish settings
    pub fn new(config: &PublishConfig) -> Result<Self, PublishError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: config.wordpress_url.trim_end_matches('/').to_string(),
            user: config.wordpress_user.clone(),
            app_password: config.wordpress_app_password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{path}", self.base_url)
    }

    /// POST a JSON body and decode the JSON response, classifying rejections
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, PublishError> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.user, Some(&self.app_password))
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, PublishError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.user, Some(&self.app_password))
            .query(query)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, PublishError> {
        let status = response.status();
        let payload: Value = match response.json().await {
            Ok(value) => value,
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => return Err(PublishError::Transport(e)),
        };

        if !status.is_success() {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown WordPress error")
                .to_string();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(payload)
    }

    /// Resolve a term name to its id within a taxonomy, creating it if absent
    async fn ensure_term(&self, taxonomy: &str, name: &str) -> Result<u64, PublishError> {
        let url = self.endpoint(taxonomy);

        let found = self.get_json(&url, &[("search", name)]).await?;
        if let Some(terms) = found.as_array() {
            for term in terms {
                let matches = term
                    .get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| n.eq_ignore_ascii_case(name));
                if matches {
                    if let Some(id) = term.get("id").and_then(Value::as_u64) {
                        return Ok(id);
                    }
                }
            }
        }

        let created = self.post_json(&url, &json!({ "name": name })).await?;
        created
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| PublishError::Unparseable(format!("no id in created {taxonomy} term")))
    }

    /// Download the image and sideload it into the media library
    async fn upload_image(&self, image: &ImageRef) -> Result<u64, PublishError> {
        let bytes = self
            .client
            .get(&image.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let response = self
            .client
            .post(self.endpoint("media"))
            .basic_auth(&self.user, Some(&self.app_password))
            .header("Content-Type", "image/jpeg")
            .header(
                "Content-Disposition",
                "attachment; filename=\"featured.jpg\"",
            )
            .body(bytes.to_vec())
            .send()
            .await?;

        let payload = Self::decode(response).await?;
        let media_id = payload
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| PublishError::Unparseable("no id in media response".to_string()))?;

        // Record alt text and credit on the attachment; a failure here is
        // not worth failing the whole publish
        let detail = json!({
            "alt_text": image.alt_text,
            "caption": image.credit,
        });
        if let Err(e) = self
            .post_json(&format!("{}/{media_id}", self.endpoint("media")), &detail)
            .await
        {
            tracing::warn!(media_id, error = %e, "Failed to set image metadata");
        }

        Ok(media_id)
    }
}

#[async_trait]
impl Publisher for WordPressPublisher {
    async fn publish(&self, draft: &PostDraft) -> Result<DocumentId, PublishError> {
        let category_id = self.ensure_term("categories", &draft.category).await?;

        let mut tag_ids = Vec::with_capacity(draft.tags.len());
        for tag in &draft.tags {
            tag_ids.push(self.ensure_term("tags", tag).await?);
        }

        let featured_media = match &draft.image {
            Some(image) => match self.upload_image(image).await {
                Ok(id) => Some(id),
                // The post is still worth publishing without its image
                Err(e) => {
                    tracing::warn!(error = %e, "Featured image upload failed, publishing without");
                    None
                }
            },
            None => None,
        };

        let mut body = json!({
            "title": draft.title,
            "content": draft.body,
            "excerpt": draft.excerpt,
            "status": if draft.publish { "publish" } else { "draft" },
            "categories": [category_id],
            "tags": tag_ids,
            "meta": Value::Object(draft.meta.clone()),
        });
        if let Some(media_id) = featured_media {
            body["featured_media"] = media_id.into();
        }
        if let Some(date) = draft.date {
            body["date"] = date.format("%Y-%m-%dT%H:%M:%S").to_string().into();
        }

        let created = self.post_json(&self.endpoint("posts"), &body).await?;
        let post_id = created
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| PublishError::Unparseable("no id in post response".to_string()))?;

        tracing::info!(post_id, title = %draft.title, publish = draft.publish, "Post created");
        Ok(DocumentId(post_id.to_string()))
    }
}
