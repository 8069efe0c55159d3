//! Chat session and message types.
//!
//! A chat session is identified by an opaque caller-supplied string id
//! (typically a UUID). Messages form an append-only log per session,
//! totally ordered by a store-assigned monotonic `msg_id`. Reasoning
//! extracted from a `<think>…</think>` span is persisted as its own
//! `assistant_think` message, interleaved in log order but filterable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a persisted chat message.
///
/// Persisted as a plain string for forward compatibility and validated on
/// read, not on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    /// Chain-of-thought side channel extracted from a reasoning span.
    AssistantThink,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
            ChatRole::AssistantThink => write!(f, "assistant_think"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            "assistant_think" => Ok(ChatRole::AssistantThink),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

/// One row of `list_sessions`: identity, creation time, optional title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub chat_id: String,
    pub created_at: DateTime<Utc>,
    pub title: Option<String>,
}

/// One entry of a chat history as handed to callers and to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub role: ChatRole,
    pub content: String,
}

/// Output channel of the stream demultiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentChannel {
    Think,
    Answer,
}

/// A tagged fragment of demultiplexed backend output.
///
/// Within a channel, concatenating fragment texts in emission order
/// reconstructs that channel's full text exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFragment {
    pub channel: FragmentChannel,
    pub text: String,
}

impl StreamFragment {
    pub fn think(text: impl Into<String>) -> Self {
        Self {
            channel: FragmentChannel::Think,
            text: text.into(),
        }
    }

    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            channel: FragmentChannel::Answer,
            text: text.into(),
        }
    }
}

/// Result of a completed blocking turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Final answer text, reasoning span removed.
    pub reply: String,
    /// Reasoning span content, when the backend emitted one.
    pub reasoning: Option<String>,
    /// Full history after the turn, including the new messages.
    pub history: Vec<TurnRecord>,
    /// Title generated on the session's first turn, if any.
    pub title: Option<String>,
}
