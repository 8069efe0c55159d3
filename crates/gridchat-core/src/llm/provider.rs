//! LlmProvider trait definition.
//!
//! The abstraction every inference backend implements: an OpenAI-compatible
//! HTTP server, a remote process fed JSON over stdio, or a test double.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition) for `complete`;
//! `stream` returns a boxed stream so providers stay object-safe behind
//! generic parameters.

use std::pin::Pin;

use futures_util::Stream;

use gridchat_types::error::BackendError;
use gridchat_types::llm::{CompletionRequest, CompletionResponse};

/// A stream of raw text deltas from the backend.
///
/// Delta boundaries carry no semantic meaning: any substring of the eventual
/// response, including a `<think>` delimiter, may be split across deltas.
/// The stream ends when the backend signals completion; dropping it early
/// closes the underlying connection.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send + 'static>>;

/// Trait for inference backends.
///
/// Implementations live in `gridchat-infra` (e.g. `OpenAiCompatibleProvider`,
/// `RemoteProcessProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable backend name (e.g. "openai_compat", "remote").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response at once.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, BackendError>> + Send;

    /// Send a streaming completion request. Returns a stream of content
    /// deltas in generation order.
    fn stream(&self, request: CompletionRequest) -> DeltaStream;
}
