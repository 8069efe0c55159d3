//! OpenAI-compatible LLM provider implementation.
//!
//! A single [`OpenAiCompatibleProvider`] serves any server speaking the
//! OpenAI chat completions protocol: a local Ollama or llama.cpp instance,
//! or the hosted OpenAI API, selected by base URL.
//!
//! Uses [`async_openai`] for type-safe request/response handling and
//! built-in SSE streaming.

pub mod config;
pub mod streaming;

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_openai::Client;

use gridchat_core::llm::{DeltaStream, LlmProvider};
use gridchat_types::error::BackendError;
use gridchat_types::llm::{CompletionRequest, CompletionResponse, MessageRole};

use self::config::OpenAiCompatConfig;
use self::streaming::map_delta_stream;

/// Unified provider for any OpenAI-compatible API.
///
/// # API Key Security
///
/// Does NOT derive Debug to prevent accidental exposure of the API key
/// stored inside the `async_openai::Client`.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatibleProvider {
    /// Create a new OpenAI-compatible provider from a configuration.
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            model: config.model,
            timeout: config.timeout,
        }
    }

    /// Create a provider for a local Ollama server.
    ///
    /// Uses `http://127.0.0.1:11434/v1` as the base URL.
    pub fn ollama(model: &str) -> Self {
        Self::new(config::ollama_defaults(model))
    }

    /// Create an OpenAI provider.
    ///
    /// Uses `https://api.openai.com/v1` as the base URL.
    pub fn openai(api_key: &str, model: &str) -> Self {
        Self::new(config::openai_defaults(api_key, model))
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
    fn build_request(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(ref system) = request.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.clone()),
                    name: None,
                },
            ));
        }

        for msg in &request.messages {
            let oai_msg = match msg.role {
                MessageRole::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    },
                ),
                MessageRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    },
                ),
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                                msg.content.clone(),
                            )),
                            refusal: None,
                            name: None,
                            audio: None,
                            tool_calls: None,
                            function_call: None,
                        },
                    )
                }
            };
            messages.push(oai_msg);
        }

        // Use the model from the request if set, otherwise fall back to config default
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        let mut req = CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature as f32),
            top_p: Some(request.top_p as f32),
            ..Default::default()
        };

        if stream {
            req.stream = Some(true);
        }

        req
    }
}

// OpenAiCompatibleProvider intentionally does NOT derive Debug to prevent
// accidental exposure of internal state including the API key inside the
// async-openai Client.

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let oai_request = self.build_request(request, false);

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(oai_request))
            .await
            .map_err(|_| BackendError::Timeout)?
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: response.model,
        })
    }

    fn stream(&self, request: CompletionRequest) -> DeltaStream {
        let oai_request = self.build_request(&request, true);

        // Clone the client for the 'static stream closure
        let client = self.client.clone();
        let timeout = self.timeout;

        Box::pin(async_stream::try_stream! {
            // The deadline covers connecting and receiving the response
            // headers; once deltas flow, generation paces the stream.
            let oai_stream =
                match tokio::time::timeout(timeout, client.chat().create_stream(oai_request)).await
                {
                    Ok(result) => result.map_err(map_openai_error)?,
                    Err(_) => Err(BackendError::Timeout)?,
                };

            let mut inner = map_delta_stream(oai_stream);

            use futures_util::StreamExt;
            while let Some(delta) = inner.next().await {
                match delta {
                    Ok(text) => yield text,
                    Err(e) => Err(e)?,
                }
            }
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to a [`BackendError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> BackendError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                BackendError::AuthenticationFailed
            } else {
                BackendError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => {
            if reqwest_err.status().is_some_and(|s| s.as_u16() == 401) {
                BackendError::AuthenticationFailed
            } else if reqwest_err.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::Http(err.to_string())
            }
        }
        OpenAIError::JSONDeserialize(_, content) => {
            BackendError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::StreamError(stream_err) => BackendError::Stream(stream_err.to_string()),
        OpenAIError::InvalidArgument(msg) => BackendError::InvalidRequest(msg.clone()),
        _ => BackendError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridchat_types::llm::{GenerationConfig, Message};

    fn sample_request() -> CompletionRequest {
        CompletionRequest::new(
            "llama3.2:3b",
            vec![
                Message {
                    role: MessageRole::User,
                    content: "Hello".to_string(),
                },
                Message {
                    role: MessageRole::Assistant,
                    content: "Hi there!".to_string(),
                },
            ],
            &GenerationConfig::default(),
        )
    }

    #[test]
    fn test_ollama_factory() {
        let provider = OpenAiCompatibleProvider::ollama("llama3.2:3b");
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model, "llama3.2:3b");
    }

    #[test]
    fn test_openai_factory() {
        let provider = OpenAiCompatibleProvider::openai("sk-test", "gpt-4o-mini");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model, "gpt-4o-mini");
    }

    #[test]
    fn test_build_request_messages() {
        let provider = OpenAiCompatibleProvider::ollama("llama3.2:3b");
        let mut request = sample_request();
        request.system = Some("Be helpful".to_string());

        let oai_req = provider.build_request(&request, false);
        assert_eq!(oai_req.model, "llama3.2:3b");
        // 1 system + 2 conversation = 3 messages
        assert_eq!(oai_req.messages.len(), 3);
        assert_eq!(oai_req.max_completion_tokens, Some(4096));
        assert_eq!(oai_req.temperature, Some(0.7));
        assert!(oai_req.stream.is_none());
    }

    #[test]
    fn test_build_request_streaming() {
        let provider = OpenAiCompatibleProvider::ollama("llama3.2:3b");
        let oai_req = provider.build_request(&sample_request(), true);
        assert_eq!(oai_req.stream, Some(true));
    }

    #[test]
    fn test_build_request_empty_model_uses_default() {
        let provider = OpenAiCompatibleProvider::ollama("llama3.2:3b");
        let mut request = sample_request();
        request.model = String::new();

        let oai_req = provider.build_request(&request, false);
        assert_eq!(oai_req.model, "llama3.2:3b");
    }

    #[test]
    fn test_map_openai_error_api_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("authentication_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, BackendError::AuthenticationFailed));
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, BackendError::InvalidRequest(_)));
    }
}
