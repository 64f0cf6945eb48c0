//! SEO meta-field strategies
//!
//! Each supported SEO plugin stores its description and focus keyword under
//! its own meta keys. The strategy is selected by plugin name; unrecognized
//! names degrade to the generic field set so publishing never fails on a
//! misspelled plugin setting.

use serde_json::{Map, Value};

use crate::models::NormalizedContent;

/// Build plugin-specific meta fields for a draft
pub fn meta_fields(plugin: &str, content: &NormalizedContent) -> Map<String, Value> {
    let mut meta = Map::new();
    let description = Value::String(content.meta_description.clone());
    let keyword = Value::String(content.focus_keyword.clone());

    match plugin {
        "yoast" => {
            meta.insert("_yoast_wpseo_metadesc".into(), description);
            meta.insert("_yoast_wpseo_focuskw".into(), keyword);
        }
        "rankmath" => {
            meta.insert("rank_math_description".into(), description);
            meta.insert("rank_math_focus_keyword".into(), keyword);
        }
        "aioseo" => {
            meta.insert("_aioseo_description".into(), description);
            meta.insert("_aioseo_keywords".into(), keyword);
        }
        other => {
            if other != "basic" {
                tracing::warn!(plugin = %other, "Unknown SEO plugin, using generic meta fields");
            }
            meta.insert("_meta_description".into(), description);
            meta.insert("_focus_keyword".into(), keyword);
        }
    }

    meta
}
