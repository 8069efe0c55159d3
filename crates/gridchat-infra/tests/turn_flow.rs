//! End-to-end turn flow over the real SQLite store.
//!
//! Exercises `ChatService` with `SqliteChatStore` and a scripted backend:
//! streamed deltas split mid-delimiter, reasoning and answer routed to
//! their channels, both persisted in order, title set on the first turn.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures_util::StreamExt;

use gridchat_core::chat::{ChatService, ChatStore};
use gridchat_core::llm::{DeltaStream, LlmProvider};
use gridchat_infra::sqlite::{DatabasePool, SqliteChatStore};
use gridchat_types::chat::{ChatRole, FragmentChannel};
use gridchat_types::error::BackendError;
use gridchat_types::llm::{CompletionRequest, CompletionResponse, GenerationConfig};

/// Backend double: `complete` pops scripted responses in order, `stream`
/// replays a fixed delta sequence.
struct ScriptedProvider {
    completions: Mutex<VecDeque<String>>,
    deltas: Vec<String>,
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let content = self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected complete call");
        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
        })
    }

    fn stream(&self, _request: CompletionRequest) -> DeltaStream {
        let deltas = self.deltas.clone();
        Box::pin(futures_util::stream::iter(deltas.into_iter().map(Ok)))
    }
}

#[tokio::test]
async fn streamed_turn_persists_both_channels_and_title() {
    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::open(&dir.path().join("chat.db")).await.unwrap();
    let store = SqliteChatStore::new(pool);

    let provider = ScriptedProvider {
        // First turn triggers a title request before the streaming call.
        completions: Mutex::new(VecDeque::from(["\"Hardware Questions\"".to_string()])),
        // Delimiter split across delta boundaries on purpose.
        deltas: vec![
            "<thi".to_string(),
            "nk>checking the inventory</th".to_string(),
            "ink>the answer is 42".to_string(),
        ],
    };

    let service = ChatService::new(store.clone(), provider);
    let generation = GenerationConfig::default();

    let fragments: Vec<_> = service
        .stream_turn("chat-1", "how many disks are installed?", "test-model", &generation)
        .collect()
        .await;

    let mut think = String::new();
    let mut answer = String::new();
    for frag in fragments {
        let frag = frag.unwrap();
        match frag.channel {
            FragmentChannel::Think => think.push_str(&frag.text),
            FragmentChannel::Answer => answer.push_str(&frag.text),
        }
    }
    assert_eq!(think, "checking the inventory");
    assert_eq!(answer, "the answer is 42");

    let history = store.fetch_history("chat-1").await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, ChatRole::User);
    assert_eq!(history[0].content, "how many disks are installed?");
    assert_eq!(history[1].role, ChatRole::AssistantThink);
    assert_eq!(history[1].content, "checking the inventory");
    assert_eq!(history[2].role, ChatRole::Assistant);
    assert_eq!(history[2].content, "the answer is 42");

    // Title generated from the first prompt, surrounding quotes stripped.
    assert_eq!(
        store.get_title("chat-1").await.unwrap().as_deref(),
        Some("Hardware Questions")
    );

    let sessions = store.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].chat_id, "chat-1");
}

#[tokio::test]
async fn blocking_turn_round_trips_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::open(&dir.path().join("chat.db")).await.unwrap();
    let store = SqliteChatStore::new(pool);

    let provider = ScriptedProvider {
        completions: Mutex::new(VecDeque::from([
            "First Session".to_string(),
            "<think>short thought</think>plain reply".to_string(),
            "a follow-up reply".to_string(),
        ])),
        deltas: vec![],
    };

    let service = ChatService::new(store.clone(), provider);
    let generation = GenerationConfig::default();

    let outcome = service
        .send_turn("chat-1", "hello", "test-model", &generation)
        .await
        .unwrap();
    assert_eq!(outcome.reply, "plain reply");
    assert_eq!(outcome.reasoning.as_deref(), Some("short thought"));
    assert_eq!(outcome.title.as_deref(), Some("First Session"));
    assert_eq!(outcome.history.len(), 3);

    // Second turn: no title request, reasoning absent.
    let outcome = service
        .send_turn("chat-1", "and again?", "test-model", &generation)
        .await
        .unwrap();
    assert_eq!(outcome.reply, "a follow-up reply");
    assert_eq!(outcome.reasoning, None);
    assert_eq!(outcome.title, None);
    assert_eq!(outcome.history.len(), 5);

    let reasoning = store.fetch_reasoning("chat-1").await.unwrap();
    assert_eq!(reasoning, vec!["short thought"]);
}
