//! Turn orchestration: one user prompt in, reasoning/answer channels out.
//!
//! `ChatService` coordinates a single chat turn end to end: persist the
//! user prompt, fire best-effort title generation on the session's first
//! message, call the backend, route output through the demultiplexer, and
//! persist the reasoning and answer channels once the response completes.
//!
//! Generic over [`ChatStore`] and [`LlmProvider`] to keep clean
//! architecture (gridchat-core never depends on gridchat-infra).

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use gridchat_types::chat::{ChatRole, FragmentChannel, StreamFragment, TurnOutcome, TurnRecord};
use gridchat_types::error::TurnError;
use gridchat_types::llm::{CompletionRequest, GenerationConfig, Message, MessageRole};

use crate::chat::demux::{split_completion, ThinkDemux};
use crate::chat::store::ChatStore;
use crate::chat::title::generate_title;
use crate::llm::provider::LlmProvider;

/// Deadline for the auxiliary title request. Much shorter than the main
/// completion timeout: a slow or dead backend must not stall the turn
/// before the real request is even attempted.
const TITLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestrates chat turns over a durable store and an inference backend.
pub struct ChatService<S: ChatStore, P: LlmProvider> {
    store: S,
    provider: P,
    /// Model used for the auxiliary title request; falls back to the
    /// turn's model when unset.
    title_model: Option<String>,
}

impl<S: ChatStore, P: LlmProvider> ChatService<S, P> {
    pub fn new(store: S, provider: P) -> Self {
        Self {
            store,
            provider,
            title_model: None,
        }
    }

    /// Use a dedicated (typically smaller) model for title generation.
    pub fn with_title_model(mut self, model: impl Into<String>) -> Self {
        self.title_model = Some(model.into());
        self
    }

    /// Access the underlying store (session listing, history queries).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one blocking turn: returns the final answer, extracted
    /// reasoning, updated history, and the title if this was the first
    /// turn and generation succeeded.
    pub async fn send_turn(
        &self,
        chat_id: &str,
        prompt: &str,
        model: &str,
        generation: &GenerationConfig,
    ) -> Result<TurnOutcome, TurnError> {
        let (history, title) = self.begin_turn(chat_id, prompt, model).await?;

        let request = CompletionRequest::new(model, to_backend_messages(&history), generation);
        let response = self.provider.complete(&request).await?;

        let (reasoning, reply) = split_completion(&response.content);
        if let Some(ref text) = reasoning {
            self.store
                .append_message(chat_id, ChatRole::AssistantThink, text)
                .await?;
        }
        self.store
            .append_message(chat_id, ChatRole::Assistant, &reply)
            .await?;

        let history = self.store.fetch_history(chat_id).await?;
        Ok(TurnOutcome {
            reply,
            reasoning,
            history,
            title,
        })
    }

    /// Run one streaming turn.
    ///
    /// Yields demultiplexed fragments as the backend produces them (for
    /// live display) while accumulating both channels. On stream
    /// completion the trimmed reasoning (if non-empty) is persisted as a
    /// single `assistant_think` message strictly before the trimmed answer
    /// as a single `assistant` message.
    ///
    /// A backend error surfaces as the final stream item and persists
    /// nothing beyond the already-written user message. Dropping the
    /// stream early closes the backend connection and likewise persists
    /// nothing further.
    pub fn stream_turn<'a>(
        &'a self,
        chat_id: &'a str,
        prompt: &'a str,
        model: &'a str,
        generation: &'a GenerationConfig,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamFragment, TurnError>> + Send + 'a>> {
        Box::pin(async_stream::try_stream! {
            let (history, _title) = self.begin_turn(chat_id, prompt, model).await?;

            let mut request =
                CompletionRequest::new(model, to_backend_messages(&history), generation);
            request.stream = true;

            let mut deltas = self.provider.stream(request);
            let mut demux = ThinkDemux::new();
            let mut think_buf = String::new();
            let mut answer_buf = String::new();

            while let Some(delta) = deltas.next().await {
                let delta = delta?;
                for frag in demux.push(&delta) {
                    match frag.channel {
                        FragmentChannel::Think => think_buf.push_str(&frag.text),
                        FragmentChannel::Answer => answer_buf.push_str(&frag.text),
                    }
                    yield frag;
                }
            }
            if let Some(frag) = demux.finish() {
                match frag.channel {
                    FragmentChannel::Think => think_buf.push_str(&frag.text),
                    FragmentChannel::Answer => answer_buf.push_str(&frag.text),
                }
                yield frag;
            }

            let reasoning = think_buf.trim();
            if !reasoning.is_empty() {
                self.store
                    .append_message(chat_id, ChatRole::AssistantThink, reasoning)
                    .await?;
            }
            self.store
                .append_message(chat_id, ChatRole::Assistant, answer_buf.trim())
                .await?;
            debug!(chat_id, "turn persisted");
        })
    }

    /// Shared turn prelude: ensure the session exists, persist the user
    /// prompt, and on the session's first message attempt best-effort
    /// title generation. Returns the history including the new prompt.
    async fn begin_turn(
        &self,
        chat_id: &str,
        prompt: &str,
        model: &str,
    ) -> Result<(Vec<TurnRecord>, Option<String>), TurnError> {
        self.store.create_session(chat_id).await?;
        self.store
            .append_message(chat_id, ChatRole::User, prompt)
            .await?;
        let history = self.store.fetch_history(chat_id).await?;

        let mut title = None;
        if history.len() == 1 {
            title = self.try_generate_title(chat_id, prompt, model).await;
        }
        Ok((history, title))
    }

    /// Title generation is side-effect-only: every failure (backend,
    /// storage, or the 30s deadline) is logged and discarded so it can
    /// never block or abort the turn.
    async fn try_generate_title(&self, chat_id: &str, prompt: &str, model: &str) -> Option<String> {
        let title_model = self.title_model.as_deref().unwrap_or(model);
        let result =
            tokio::time::timeout(TITLE_TIMEOUT, generate_title(&self.provider, prompt, title_model))
                .await;
        match result {
            Ok(Ok(title)) if !title.is_empty() => {
                if let Err(err) = self.store.set_title(chat_id, &title).await {
                    warn!(chat_id, %err, "failed to store generated title");
                }
                Some(title)
            }
            Ok(Ok(_)) => None,
            Ok(Err(err)) => {
                warn!(chat_id, %err, "failed to generate title");
                None
            }
            Err(_) => {
                warn!(chat_id, "title generation timed out");
                None
            }
        }
    }
}

/// Map persisted history to backend request messages.
///
/// Reasoning rows are sent with the assistant role: the backend sees its
/// own prior chain-of-thought as ordinary assistant context.
fn to_backend_messages(history: &[TurnRecord]) -> Vec<Message> {
    history
        .iter()
        .map(|record| Message {
            role: match record.role {
                ChatRole::User => MessageRole::User,
                ChatRole::Assistant | ChatRole::AssistantThink => MessageRole::Assistant,
            },
            content: record.content.clone(),
        })
        .collect()
}
