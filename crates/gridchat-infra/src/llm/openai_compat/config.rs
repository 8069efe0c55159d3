//! Configuration for OpenAI-compatible providers.

use std::time::Duration;

/// Configuration for an [`super::OpenAiCompatibleProvider`].
#[derive(Clone)]
pub struct OpenAiCompatConfig {
    /// Provider name for logging and identification.
    pub provider_name: String,
    /// Base URL of the chat completions endpoint (without the
    /// `/chat/completions` suffix).
    pub base_url: String,
    /// API key. Local servers ignore it but the header must be present.
    pub api_key: String,
    /// Default model when a request does not name one.
    pub model: String,
    /// Per-request deadline covering connect plus generation.
    pub timeout: Duration,
}

/// Config for a local Ollama server's OpenAI-compatible endpoint.
///
/// Ollama does not check the key, so a placeholder is sent.
pub fn ollama_defaults(model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "ollama".to_string(),
        base_url: "http://127.0.0.1:11434/v1".to_string(),
        api_key: "ollama".to_string(),
        model: model.to_string(),
        timeout: Duration::from_secs(300),
    }
}

/// Config for the hosted OpenAI API.
pub fn openai_defaults(api_key: &str, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".to_string(),
        base_url: "https://api.openai.com/v1".to_string(),
        api_key: api_key.to_string(),
        model: model.to_string(),
        timeout: Duration::from_secs(300),
    }
}
