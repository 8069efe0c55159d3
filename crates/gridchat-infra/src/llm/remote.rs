//! Remote-process inference backend.
//!
//! Spawns a configured command (typically `ssh host worker-cmd`), writes one
//! JSON request to its stdin, and reads one JSON reply from its stdout. The
//! worker owns the actual model; this side only does process plumbing.
//!
//! The wire format is a single request/reply pair per invocation:
//! `{"chat_id": ..., "prompt": ..., "history": [...]}` in,
//! `{"response": ..., "new_history": [...]}` out.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use gridchat_core::llm::{DeltaStream, LlmProvider};
use gridchat_types::error::BackendError;
use gridchat_types::llm::{CompletionRequest, CompletionResponse, Message, MessageRole};

/// How to reach the remote worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteExecConfig {
    /// Program to spawn, e.g. `ssh`.
    pub program: String,
    /// Arguments, e.g. `["gpu-box", "gridchat-worker"]`.
    pub args: Vec<String>,
    /// Deadline for the whole invocation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

/// Request written to the worker's stdin.
#[derive(Debug, Serialize, Deserialize)]
struct RemotePayload {
    chat_id: String,
    prompt: String,
    history: Vec<Message>,
}

/// Reply read from the worker's stdout.
#[derive(Debug, Serialize, Deserialize)]
struct RemoteReply {
    response: String,
    #[serde(default)]
    new_history: Vec<Message>,
}

/// Provider that delegates each completion to a spawned worker process.
pub struct RemoteProcessProvider {
    config: RemoteExecConfig,
    /// Stable id sent with every payload so the worker can correlate
    /// invocations from the same local session.
    session_id: String,
}

impl RemoteProcessProvider {
    pub fn new(config: RemoteExecConfig) -> Self {
        Self {
            config,
            session_id: Uuid::now_v7().to_string(),
        }
    }
}

/// Split a request into (history, trailing user prompt) for the wire format.
fn to_payload(session_id: &str, request: &CompletionRequest) -> Result<RemotePayload, BackendError> {
    let (last, history) = request
        .messages
        .split_last()
        .ok_or_else(|| BackendError::InvalidRequest("empty conversation".to_string()))?;

    if last.role != MessageRole::User {
        return Err(BackendError::InvalidRequest(
            "conversation must end with a user message".to_string(),
        ));
    }

    Ok(RemotePayload {
        chat_id: session_id.to_string(),
        prompt: last.content.clone(),
        history: history.to_vec(),
    })
}

async fn run_remote(
    config: &RemoteExecConfig,
    session_id: &str,
    request: &CompletionRequest,
) -> Result<String, BackendError> {
    let payload = to_payload(session_id, request)?;
    let mut line =
        serde_json::to_string(&payload).map_err(|e| BackendError::Deserialization(e.to_string()))?;
    line.push('\n');

    debug!(program = %config.program, "spawning remote worker");

    let mut child = Command::new(&config.program)
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| BackendError::Process(format!("spawn {}: {e}", config.program)))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| BackendError::Process("stdin unavailable".to_string()))?;
    stdin
        .write_all(line.as_bytes())
        .await
        .map_err(|e| BackendError::Process(format!("write request: {e}")))?;
    drop(stdin);

    // Dropping the wait future on timeout kills the child via kill_on_drop.
    let output = tokio::time::timeout(
        Duration::from_secs(config.timeout_secs),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| BackendError::Timeout)?
    .map_err(|e| BackendError::Process(format!("wait: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BackendError::Process(format!(
            "worker exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let reply: RemoteReply = serde_json::from_slice(&output.stdout)
        .map_err(|e| BackendError::Deserialization(format!("worker reply: {e}")))?;
    Ok(reply.response)
}

impl LlmProvider for RemoteProcessProvider {
    fn name(&self) -> &str {
        "remote"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let content = run_remote(&self.config, &self.session_id, request).await?;
        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
        })
    }

    /// The stdio protocol has no incremental mode, so the "stream" is the
    /// full response as one delta.
    fn stream(&self, request: CompletionRequest) -> DeltaStream {
        let config = self.config.clone();
        let session_id = self.session_id.clone();

        Box::pin(async_stream::try_stream! {
            let content = run_remote(&config, &session_id, &request).await?;
            yield content;
        })
    }
}
