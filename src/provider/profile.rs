//! Static provider profile table
//!
//! Each supported provider is described declaratively: endpoint, auth header
//! shape, request body shape, fixed generation parameters, and the JSON path
//! to the generated text. The client in [`super::client`] is a single generic
//! executor over this table, which keeps per-provider logic out of the
//! request/response code paths.

use serde_json::{json, Value};

/// How the API key is attached to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `Authorization: Token <key>` (Replicate)
    Token,
    /// `x-api-key: <key>` plus a pinned `anthropic-version` header
    AnthropicApiKey,
    /// `?key=<key>` query parameter (Gemini)
    QueryParam,
}

/// Request body shape, keyed by the field names the provider expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// OpenAI-style `messages` array with a system role
    ChatMessages,
    /// Anthropic-style `messages` array, `max_tokens` at top level, no system role
    AnthropicMessages,
    /// Gemini-style nested `contents[].parts[].text`
    GeminiContents,
    /// Cohere-style single `message` field
    CohereMessage,
    /// Hugging Face inference `inputs` field with nested `parameters`
    RawInputs,
    /// Replicate-style `input.prompt`
    ReplicateInput,
}

/// Completion semantics of the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// The creation response carries the generated text
    Immediate,
    /// The creation response carries a status URL that must be polled until
    /// the run leaves the `starting`/`processing` states
    Polled,
}

/// System prompt sent to chat-shaped providers
pub const SYSTEM_PROMPT: &str = "You are a professional content writer. \
Always respond with well-structured, engaging content. If asked to format \
as JSON, ensure valid JSON format.";

/// Declarative description of one provider
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub auth: AuthStyle,
    pub shape: RequestShape,
    pub completion: CompletionMode,
    pub default_model: &'static str,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Dotted path to the generated text in the response body;
    /// numeric segments index into arrays
    pub content_path: &'static str,
    /// Dotted path to the usage object, when the provider reports one
    pub usage_path: Option<&'static str>,
    /// Model catalog reported by `test-connection`
    pub models: &'static [&'static str],
}

/// All supported providers
///
/// Order is not significant; lookup is by name.
pub static PROFILES: &[ProviderProfile] = &[
    ProviderProfile {
        name: "perplexity",
        endpoint: "https://api.perplexity.ai/chat/completions",
        auth: AuthStyle::Bearer,
        shape: RequestShape::ChatMessages,
        completion: CompletionMode::Immediate,
        default_model: "llama-3.1-sonar-small-128k-online",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "choices.0.message.content",
        usage_path: Some("usage"),
        models: &[
            "llama-3.1-sonar-small-128k-online",
            "llama-3.1-sonar-large-128k-online",
            "llama-3.1-sonar-huge-128k-online",
        ],
    },
    ProviderProfile {
        name: "openai",
        endpoint: "https://api.openai.com/v1/chat/completions",
        auth: AuthStyle::Bearer,
        shape: RequestShape::ChatMessages,
        completion: CompletionMode::Immediate,
        default_model: "gpt-3.5-turbo",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "choices.0.message.content",
        usage_path: Some("usage"),
        models: &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo"],
    },
    ProviderProfile {
        name: "anthropic",
        endpoint: "https://api.anthropic.com/v1/messages",
        auth: AuthStyle::AnthropicApiKey,
        shape: RequestShape::AnthropicMessages,
        completion: CompletionMode::Immediate,
        default_model: "claude-3-sonnet-20240229",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "content.0.text",
        usage_path: Some("usage"),
        models: &[
            "claude-3-sonnet-20240229",
            "claude-3-opus-20240229",
            "claude-3-haiku-20240307",
        ],
    },
    ProviderProfile {
        name: "deepseek",
        endpoint: "https://api.deepseek.com/chat/completions",
        auth: AuthStyle::Bearer,
        shape: RequestShape::ChatMessages,
        completion: CompletionMode::Immediate,
        default_model: "deepseek-chat",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "choices.0.message.content",
        usage_path: Some("usage"),
        models: &["deepseek-chat", "deepseek-reasoner"],
    },
    ProviderProfile {
        name: "mistral",
        endpoint: "https://api.mistral.ai/v1/chat/completions",
        auth: AuthStyle::Bearer,
        shape: RequestShape::ChatMessages,
        completion: CompletionMode::Immediate,
        default_model: "mistral-small-latest",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "choices.0.message.content",
        usage_path: Some("usage"),
        models: &["mistral-small-latest", "mistral-large-latest"],
    },
    ProviderProfile {
        name: "groq",
        endpoint: "https://api.groq.com/openai/v1/chat/completions",
        auth: AuthStyle::Bearer,
        shape: RequestShape::ChatMessages,
        completion: CompletionMode::Immediate,
        default_model: "llama-3.1-70b-versatile",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "choices.0.message.content",
        usage_path: Some("usage"),
        models: &["llama-3.1-70b-versatile", "mixtral-8x7b-32768"],
    },
    ProviderProfile {
        name: "gemini",
        endpoint: "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent",
        auth: AuthStyle::QueryParam,
        shape: RequestShape::GeminiContents,
        completion: CompletionMode::Immediate,
        default_model: "gemini-1.5-flash",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "candidates.0.content.parts.0.text",
        usage_path: Some("usageMetadata"),
        models: &["gemini-1.5-flash", "gemini-1.5-pro"],
    },
    ProviderProfile {
        name: "cohere",
        endpoint: "https://api.cohere.com/v1/chat",
        auth: AuthStyle::Bearer,
        shape: RequestShape::CohereMessage,
        completion: CompletionMode::Immediate,
        default_model: "command-r",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "text",
        usage_path: Some("meta.tokens"),
        models: &["command-r", "command-r-plus"],
    },
    ProviderProfile {
        name: "huggingface",
        endpoint: "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.3",
        auth: AuthStyle::Bearer,
        shape: RequestShape::RawInputs,
        completion: CompletionMode::Immediate,
        default_model: "mistralai/Mistral-7B-Instruct-v0.3",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "0.generated_text",
        usage_path: None,
        models: &["mistralai/Mistral-7B-Instruct-v0.3"],
    },
    ProviderProfile {
        name: "replicate",
        endpoint: "https://api.replicate.com/v1/predictions",
        auth: AuthStyle::Token,
        shape: RequestShape::ReplicateInput,
        completion: CompletionMode::Polled,
        default_model: "meta/meta-llama-3-8b-instruct",
        max_tokens: 2000,
        temperature: 0.7,
        content_path: "output",
        usage_path: Some("metrics"),
        models: &["meta/meta-llama-3-8b-instruct", "meta/meta-llama-3-70b-instruct"],
    },
];

/// Resolve a provider name to its profile
///
/// Unknown names are an error for the caller to surface; there is no silent
/// fallback to a default provider.
pub fn lookup(name: &str) -> Option<&'static ProviderProfile> {
    PROFILES.iter().find(|p| p.name == name)
}

impl ProviderProfile {
    /// Build the provider-specific request body for a prompt
    pub fn build_body(&self, prompt: &str, model: Option<&str>) -> Value {
        let model = model.unwrap_or(self.default_model);

        match self.shape {
            RequestShape::ChatMessages => json!({
                "model": model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": prompt },
                ],
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
            }),
            RequestShape::AnthropicMessages => json!({
                "model": model,
                "max_tokens": self.max_tokens,
                "messages": [
                    { "role": "user", "content": prompt },
                ],
            }),
            RequestShape::GeminiContents => json!({
                "contents": [
                    { "parts": [ { "text": prompt } ] },
                ],
                "generationConfig": {
                    "maxOutputTokens": self.max_tokens,
                    "temperature": self.temperature,
                },
            }),
            RequestShape::CohereMessage => json!({
                "model": model,
                "message": prompt,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
            }),
            RequestShape::RawInputs => json!({
                "inputs": prompt,
                "parameters": {
                    "max_new_tokens": self.max_tokens,
                    "temperature": self.temperature,
                    "return_full_text": false,
                },
            }),
            RequestShape::ReplicateInput => json!({
                "version": model,
                "input": {
                    "prompt": prompt,
                    "max_tokens": self.max_tokens,
                    "temperature": self.temperature,
                },
            }),
        }
    }
}

/// Walk a dotted path through a JSON value
///
/// Numeric segments index into arrays, everything else into objects.
pub fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_providers() {
        for name in ["perplexity", "openai", "anthropic", "replicate"] {
            assert!(lookup(name).is_some(), "missing profile for {name}");
        }
    }

    #[test]
    fn test_lookup_unknown_provider() {
        assert!(lookup("llamacloud").is_none());
    }

    #[test]
    fn test_chat_body_contains_system_prompt() {
        let profile = lookup("openai").unwrap();
        let body = profile.build_body("Write about cats", None);
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Write about cats");
        assert_eq!(body["max_tokens"], 2000);
    }

    #[test]
    fn test_anthropic_body_has_no_system_role() {
        let profile = lookup("anthropic").unwrap();
        let body = profile.build_body("Hello", Some("claude-3-opus-20240229"));
        assert_eq!(body["model"], "claude-3-opus-20240229");
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body["messages"].as_array().unwrap().len() == 1);
    }

    #[test]
    fn test_inputs_body_shape() {
        let profile = lookup("huggingface").unwrap();
        let body = profile.build_body("Hello", None);
        assert_eq!(body["inputs"], "Hello");
        assert_eq!(body["parameters"]["max_new_tokens"], 2000);
    }

    #[test]
    fn test_replicate_body_shape() {
        let profile = lookup("replicate").unwrap();
        let body = profile.build_body("Hello", None);
        assert_eq!(body["input"]["prompt"], "Hello");
        assert_eq!(profile.completion, CompletionMode::Polled);
    }

    #[test]
    fn test_json_path_walks_arrays_and_objects() {
        let value = serde_json::json!({
            "choices": [ { "message": { "content": "hi" } } ]
        });
        let found = json_path(&value, "choices.0.message.content").unwrap();
        assert_eq!(found, "hi");
        assert!(json_path(&value, "choices.1.message").is_none());
        assert!(json_path(&value, "data").is_none());
    }
}
