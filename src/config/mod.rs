//! Configuration management
//!
//! Configuration is a passive value object handed to the dispatcher,
//! provider client, and publisher at construction time — components never
//! read settings from a global store. Values load from environment
//! variables or a TOML file and are validated before use.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::provider::profile;

/// Default prompt template used when none is configured
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Write a comprehensive blog post about {topic}. \
Include an engaging title, detailed content (600-800 words), meta description, and \
relevant tags. Format the response as JSON with keys: title, content, \
meta_description, tags.";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider selection and credentials
    pub provider: ProviderConfig,

    /// Posting schedule and quota
    pub schedule: ScheduleConfig,

    /// Publishing target and SEO plugin choice
    pub publish: PublishConfig,

    /// Featured-image sourcing
    pub images: ImageConfig,

    /// Backdate bulk-scheduling window
    pub backdate: BackdateConfig,

    /// Job store location
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Provider selection and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Logical provider name (must exist in the profile table)
    pub name: String,

    /// API key for the provider
    pub api_key: String,

    /// Model override; the profile default is used when unset
    pub model: Option<String>,
}

/// Posting schedule and daily quota
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Prompt template; placeholder tokens are substituted per job
    pub prompt_template: String,

    /// Daily completion quota
    pub posts_per_day: u32,

    /// Start of the posting window, "HH:MM", inclusive
    pub start_time: String,

    /// End of the posting window, "HH:MM", inclusive
    pub end_time: String,

    /// Minutes between single-post trigger firings
    pub posting_interval_mins: u64,

    /// Minutes between batch-sweep trigger firings
    pub sweep_interval_mins: u64,
}

/// Publishing target and metadata strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Publish immediately instead of leaving drafts
    pub auto_publish: bool,

    /// Category applied when the content suggests none
    pub default_category: String,

    /// SEO writer strategy: yoast, rankmath, aioseo, or basic
    pub seo_plugin: String,

    /// Author identity substituted into `{author}` and recorded on posts
    pub author: String,

    /// WordPress site base URL (e.g. https://blog.example.com)
    pub wordpress_url: String,

    /// WordPress username for application-password auth
    pub wordpress_user: String,

    /// WordPress application password
    pub wordpress_app_password: String,
}

/// Featured-image sourcing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Whether to resolve a featured image at all
    pub enabled: bool,

    /// Strategy name: unsplash, pexels, or dall-e
    pub api: String,

    /// API key for the image service
    pub api_key: String,
}

/// Backdate bulk-scheduling window
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackdateConfig {
    /// Whether backdate scheduling runs on activation
    pub enabled: bool,

    /// First day of the range, "YYYY-MM-DD"
    pub start_date: String,

    /// Last day of the range, "YYYY-MM-DD", inclusive
    pub end_date: String,
}

/// Job store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            schedule: ScheduleConfig::default(),
            publish: PublishConfig::default(),
            images: ImageConfig::default(),
            backdate: BackdateConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "perplexity".to_string(),
            api_key: String::new(),
            model: None,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            posts_per_day: 2,
            start_time: "09:00".to_string(),
            end_time: "18:00".to_string(),
            posting_interval_mins: 240,
            sweep_interval_mins: 60,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            auto_publish: true,
            default_category: "Uncategorized".to_string(),
            seo_plugin: "yoast".to_string(),
            author: "postgen".to_string(),
            wordpress_url: String::new(),
            wordpress_user: String::new(),
            wordpress_app_password: String::new(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api: "unsplash".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/postgen.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("POSTGEN_PROVIDER") {
            config.provider.name = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_API_KEY") {
            config.provider.api_key = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_MODEL") {
            config.provider.model = Some(v);
        }
        if let Ok(v) = std::env::var("POSTGEN_PROMPT_TEMPLATE") {
            config.schedule.prompt_template = v;
        }
        if let Some(v) = env_parse::<u32>("POSTGEN_POSTS_PER_DAY") {
            config.schedule.posts_per_day = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_START_TIME") {
            config.schedule.start_time = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_END_TIME") {
            config.schedule.end_time = v;
        }
        if let Some(v) = env_parse::<u64>("POSTGEN_POSTING_INTERVAL_MINS") {
            config.schedule.posting_interval_mins = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_WORDPRESS_URL") {
            config.publish.wordpress_url = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_WORDPRESS_USER") {
            config.publish.wordpress_user = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_WORDPRESS_APP_PASSWORD") {
            config.publish.wordpress_app_password = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_SEO_PLUGIN") {
            config.publish.seo_plugin = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_IMAGE_API_KEY") {
            config.images.api_key = v;
            config.images.enabled = true;
        }
        if let Ok(v) = std::env::var("POSTGEN_IMAGE_API") {
            config.images.api = v;
        }
        if let Ok(v) = std::env::var("POSTGEN_DB_PATH") {
            config.database.path = v.into();
        }
        if let Ok(v) = std::env::var("POSTGEN_LOG_LEVEL") {
            config.logging.level = v;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Unknown provider names and overnight posting windows are rejected
    /// here instead of being silently coerced downstream.
    pub fn validate(&self) -> Result<()> {
        if profile::lookup(&self.provider.name).is_none() {
            anyhow::bail!(
                "unknown provider '{}'; supported: {}",
                self.provider.name,
                profile::PROFILES
                    .iter()
                    .map(|p| p.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        if self.schedule.posts_per_day == 0 {
            anyhow::bail!("posts_per_day must be greater than 0");
        }

        let (start, end) = self.posting_window()?;
        if start > end {
            anyhow::bail!(
                "posting window start {} is after end {}; overnight windows are not supported",
                self.schedule.start_time,
                self.schedule.end_time
            );
        }

        if self.backdate.enabled {
            let (start, end) = self.backdate_range()?;
            if start > end {
                anyhow::bail!("backdate start_date is after end_date");
            }
        }

        if self.images.enabled && !matches!(self.images.api.as_str(), "unsplash" | "pexels" | "dall-e") {
            anyhow::bail!("unknown image api '{}'", self.images.api);
        }

        Ok(())
    }

    /// Parse the posting window bounds
    pub fn posting_window(&self) -> Result<(NaiveTime, NaiveTime)> {
        let start = NaiveTime::parse_from_str(&self.schedule.start_time, "%H:%M")
            .with_context(|| format!("invalid start_time '{}'", self.schedule.start_time))?;
        let end = NaiveTime::parse_from_str(&self.schedule.end_time, "%H:%M")
            .with_context(|| format!("invalid end_time '{}'", self.schedule.end_time))?;
        Ok((start, end))
    }

    /// Parse the backdate date range
    pub fn backdate_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::parse_from_str(&self.backdate.start_date, "%Y-%m-%d")
            .with_context(|| format!("invalid backdate start_date '{}'", self.backdate.start_date))?;
        let end = NaiveDate::parse_from_str(&self.backdate.end_date, "%Y-%m-%d")
            .with_context(|| format!("invalid backdate end_date '{}'", self.backdate.end_date))?;
        Ok((start, end))
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.name, "perplexity");
        assert_eq!(config.schedule.posts_per_day, 2);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = Config::default();
        config.provider.name = "llamacloud".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("unknown provider"));
    }

    #[test]
    fn test_overnight_window_rejected() {
        let mut config = Config::default();
        config.schedule.start_time = "22:00".to_string();
        config.schedule.end_time = "06:00".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("overnight"));
    }

    #[test]
    fn test_equal_window_bounds_allowed() {
        let mut config = Config::default();
        config.schedule.start_time = "12:00".to_string();
        config.schedule.end_time = "12:00".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_time_rejected() {
        let mut config = Config::default();
        config.schedule.start_time = "9am".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backdate_range_order() {
        let mut config = Config::default();
        config.backdate = BackdateConfig {
            enabled: true,
            start_date: "2025-05-10".to_string(),
            end_date: "2025-05-01".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            [provider]
            name = "openai"
            api_key = "sk-test"

            [schedule]
            posts_per_day = 3
            start_time = "08:00"
            end_time = "20:00"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.provider.name, "openai");
        assert_eq!(config.schedule.posts_per_day, 3);
        // Unspecified sections keep their defaults
        assert_eq!(config.publish.seo_plugin, "yoast");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_image_api_rejected() {
        let mut config = Config::default();
        config.images.enabled = true;
        config.images.api = "imgur".to_string();
        assert!(config.validate().is_err());
    }
}
