//! Inference backend request/response types.
//!
//! These model the wire-level shapes exchanged with an OpenAI-compatible
//! chat completion endpoint or a remote inference process, independent of
//! any concrete provider implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message as sent to the inference backend.
///
/// Narrower than [`crate::chat::ChatRole`]: reasoning rows are folded into
/// the assistant role before a request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a backend conversation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Sampling parameters for a completion request.
///
/// Defaults match the values the CLI ships with: temperature 0.7,
/// top_p 0.9, 4096 max tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.9
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Request to an inference backend for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    #[serde(default)]
    pub stream: bool,
}

impl CompletionRequest {
    /// Build a request from a conversation context and sampling config.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<Message>,
        generation: &GenerationConfig,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            system: None,
            temperature: generation.temperature,
            top_p: generation.top_p,
            max_tokens: generation.max_tokens,
            stream: false,
        }
    }
}

/// Response from a non-streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Raw generated text, reasoning span (if any) still embedded.
    pub content: String,
    /// Model that produced the response, as reported by the backend.
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_generation_config_defaults() {
        let generation = GenerationConfig::default();
        assert!((generation.temperature - 0.7).abs() < f64::EPSILON);
        assert!((generation.top_p - 0.9).abs() < f64::EPSILON);
        assert_eq!(generation.max_tokens, 4096);
    }

    #[test]
    fn test_generation_config_partial_deserialize() {
        let generation: GenerationConfig =
            serde_json::from_str(r#"{"temperature": 0.2}"#).unwrap();
        assert!((generation.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(generation.max_tokens, 4096);
    }

    #[test]
    fn test_completion_request_new() {
        let req = CompletionRequest::new(
            "llama3.2:3b",
            vec![Message {
                role: MessageRole::User,
                content: "hello".to_string(),
            }],
            &GenerationConfig::default(),
        );
        assert_eq!(req.model, "llama3.2:3b");
        assert_eq!(req.messages.len(), 1);
        assert!(!req.stream);
        assert!(req.system.is_none());
    }
}
