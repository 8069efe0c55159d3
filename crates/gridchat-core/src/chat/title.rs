//! Session title generation via a short auxiliary completion.
//!
//! A low-token, low-temperature blocking request that summarizes the first
//! prompt into a 3-5 word title. Callers treat the result as best-effort:
//! any failure is logged and swallowed, never propagated into the turn.

use gridchat_types::error::BackendError;
use gridchat_types::llm::{CompletionRequest, Message, MessageRole};

use crate::llm::provider::LlmProvider;

/// System prompt for the title generation call.
const TITLE_SYSTEM_PROMPT: &str = "You are a helpful assistant that suggests chat titles.";

/// Sampling temperature for titles; low to keep them terse and stable.
const TITLE_TEMPERATURE: f64 = 0.3;

/// Token budget for a 3-5 word title.
const TITLE_MAX_TOKENS: u32 = 16;

/// Generate a short session title from the first user prompt.
///
/// The response is trimmed of whitespace and surrounding quotes.
#[tracing::instrument(name = "generate_title", skip(provider, prompt), fields(model = %model))]
pub async fn generate_title<P: LlmProvider>(
    provider: &P,
    prompt: &str,
    model: &str,
) -> Result<String, BackendError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message {
            role: MessageRole::User,
            content: format!(
                "Generate a short (3-5 word) title for a conversation about: \"{prompt}\""
            ),
        }],
        system: Some(TITLE_SYSTEM_PROMPT.to_string()),
        temperature: TITLE_TEMPERATURE,
        top_p: 0.9,
        max_tokens: TITLE_MAX_TOKENS,
        stream: false,
    };

    let response = provider.complete(&request).await?;

    let title = response
        .content
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_string();

    Ok(title)
}
