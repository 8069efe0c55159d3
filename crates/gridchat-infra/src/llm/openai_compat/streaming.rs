//! OpenAI SSE stream to raw delta adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] chunks to the
//! plain text deltas the demultiplexer consumes. Chunk boundaries are
//! passed through untouched; reassembling a `<think>` delimiter split
//! across chunks is the demultiplexer's job, not ours.

use futures_util::StreamExt;

use async_openai::types::chat::ChatCompletionResponseStream;

use gridchat_core::llm::DeltaStream;
use gridchat_types::error::BackendError;

/// Map an async-openai [`ChatCompletionResponseStream`] to a [`DeltaStream`].
///
/// Empty content chunks (role-only preambles, the final usage chunk) are
/// skipped rather than surfaced as empty deltas.
pub fn map_delta_stream(stream: ChatCompletionResponseStream) -> DeltaStream {
    Box::pin(async_stream::try_stream! {
        let mut stream = stream;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| BackendError::Stream(e.to_string()))?;

            for choice in &chunk.choices {
                if let Some(text) = choice.delta.content.clone() {
                    if !text.is_empty() {
                        yield text;
                    }
                }
            }
        }
    })
}
