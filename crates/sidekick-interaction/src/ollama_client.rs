//! OllamaClient - direct REST client for a locally hosted Ollama server.
//!
//! The client owns the linear conversation transcript submitted on every
//! turn. Failures never cross this boundary as errors: chat turns degrade
//! to an `"Error: <message>"` reply and model discovery degrades to an
//! empty catalog, so a broken connection shows up as a chat bubble rather
//! than crashing the session.

use std::sync::RwLock;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use tokio::sync::{Mutex, mpsc};

use sidekick_core::SidekickError;
use sidekick_core::inference::InferenceService;

use crate::protocol::{
    ChatRequest, ChatResponse, ChatStreamDelta, GenerateRequest, GenerateResponse, Role,
    TagsResponse, TranscriptMessage,
};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "codellama";

/// Local inference can be slow; chat requests get minutes, not seconds.
const CHAT_TIMEOUT: Duration = Duration::from_secs(300);
/// Model discovery is interactive and best-effort, so it stays short.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Ollama chat API, maintaining the rolling transcript.
pub struct OllamaClient {
    client: Client,
    server_url: RwLock<String>,
    model: RwLock<String>,
    transcript: Mutex<Vec<TranscriptMessage>>,
}

impl OllamaClient {
    pub fn new(server_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_url: RwLock::new(server_url.into()),
            model: RwLock::new(model.into()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SERVER_URL, DEFAULT_MODEL)
    }

    pub fn server_url(&self) -> String {
        self.server_url.read().expect("server url lock").clone()
    }

    pub fn set_server_url(&self, url: impl Into<String>) {
        *self.server_url.write().expect("server url lock") = url.into();
    }

    pub fn model_name(&self) -> String {
        self.model.read().expect("model lock").clone()
    }

    pub fn set_model_name(&self, model: impl Into<String>) {
        *self.model.write().expect("model lock") = model.into();
    }

    /// Snapshot of the current transcript.
    pub async fn history(&self) -> Vec<TranscriptMessage> {
        self.transcript.lock().await.clone()
    }

    /// Appends the system prompt (once, only if the transcript lacks one)
    /// and the user message (context prefixed as a fenced block), and
    /// returns the transcript to submit.
    async fn prepare_turn(
        &self,
        user_message: &str,
        system_prompt: Option<&str>,
        context: Option<&str>,
    ) -> Vec<TranscriptMessage> {
        let mut transcript = self.transcript.lock().await;

        if let Some(system) = system_prompt {
            let has_system = transcript.iter().any(|m| m.role == Role::System);
            if !has_system {
                transcript.insert(0, TranscriptMessage::new(Role::System, system));
            }
        }

        let content = match context.filter(|c| !c.trim().is_empty()) {
            Some(context) => format!("Context:\n```\n{context}\n```\n\n{user_message}"),
            None => user_message.to_string(),
        };
        transcript.push(TranscriptMessage::new(Role::User, content));

        transcript.clone()
    }

    /// Appends the assistant reply, completing a successful turn.
    async fn push_assistant(&self, reply: &str) {
        self.transcript
            .lock()
            .await
            .push(TranscriptMessage::new(Role::Assistant, reply));
    }

    /// Removes the user message of a failed turn so the transcript is left
    /// as it was before the turn started.
    async fn rollback_user(&self) {
        let mut transcript = self.transcript.lock().await;
        if transcript.last().is_some_and(|m| m.role == Role::User) {
            transcript.pop();
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.server_url())
    }

    async fn post_chat(
        &self,
        messages: Vec<TranscriptMessage>,
    ) -> Result<String, SidekickError> {
        let request = ChatRequest {
            model: self.model_name(),
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(self.chat_url())
            .timeout(CHAT_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| SidekickError::inference(format!("chat request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SidekickError::inference(format!(
                "server returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SidekickError::inference(format!("failed to parse chat response: {e}")))?;

        Ok(parsed.message.content)
    }

    async fn post_chat_stream(
        &self,
        messages: Vec<TranscriptMessage>,
        chunk_tx: &mpsc::UnboundedSender<String>,
    ) -> Result<String, SidekickError> {
        let request = ChatRequest {
            model: self.model_name(),
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(self.chat_url())
            .timeout(CHAT_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| SidekickError::inference(format!("chat request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SidekickError::inference(format!(
                "server returned {status}: {body}"
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut full = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes =
                chunk.map_err(|e| SidekickError::inference(format!("stream error: {e}")))?;
            buffer.extend_from_slice(&bytes);

            // Each complete line is one JSON delta object.
            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                let line = &line[..line.len() - 1];
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }

                let delta: ChatStreamDelta = serde_json::from_slice(line).map_err(|e| {
                    SidekickError::inference(format!("failed to parse stream line: {e}"))
                })?;

                if let Some(message) = delta.message {
                    if !message.content.is_empty() {
                        full.push_str(&message.content);
                        // The consumer may have gone away; that only stops
                        // incremental display, not the turn itself.
                        let _ = chunk_tx.send(message.content);
                    }
                }
                if delta.done {
                    return Ok(full);
                }
            }
        }

        Ok(full)
    }

    /// Legacy single-shot completion over `/api/generate`.
    pub async fn generate(&self, prompt: &str, context: &str) -> String {
        let request = GenerateRequest {
            model: self.model_name(),
            prompt: format!("Context:\n{context}\n\nQuestion:\n{prompt}"),
            stream: false,
        };

        let result: Result<GenerateResponse, SidekickError> = async {
            let response = self
                .client
                .post(format!("{}/api/generate", self.server_url()))
                .timeout(CHAT_TIMEOUT)
                .json(&request)
                .send()
                .await
                .map_err(|e| SidekickError::inference(format!("generate request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(SidekickError::inference(format!(
                    "server returned {}",
                    response.status()
                )));
            }

            response.json().await.map_err(|e| {
                SidekickError::inference(format!("failed to parse generate response: {e}"))
            })
        }
        .await;

        match result {
            Ok(parsed) if !parsed.response.is_empty() => parsed.response,
            Ok(_) => "No response generated".to_string(),
            Err(e) => format!("Error: {e}"),
        }
    }
}

#[async_trait::async_trait]
impl InferenceService for OllamaClient {
    async fn list_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.server_url());

        let result: Result<TagsResponse, SidekickError> = async {
            let response = self
                .client
                .get(&url)
                .timeout(DISCOVERY_TIMEOUT)
                .send()
                .await
                .map_err(|e| SidekickError::inference(format!("tags request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(SidekickError::inference(format!(
                    "server returned {}",
                    response.status()
                )));
            }

            response
                .json()
                .await
                .map_err(|e| SidekickError::inference(format!("failed to parse tag listing: {e}")))
        }
        .await;

        match result {
            Ok(tags) => tags
                .models
                .into_iter()
                .map(|m| m.name)
                .filter(|n| !n.is_empty())
                .collect(),
            Err(e) => {
                tracing::warn!("model discovery failed: {e}");
                Vec::new()
            }
        }
    }

    async fn send_turn(
        &self,
        user_message: &str,
        system_prompt: Option<&str>,
        context: Option<&str>,
    ) -> String {
        let messages = self.prepare_turn(user_message, system_prompt, context).await;

        match self.post_chat(messages).await {
            Ok(reply) => {
                self.push_assistant(&reply).await;
                reply
            }
            Err(e) => {
                self.rollback_user().await;
                format!("Error: {e}")
            }
        }
    }

    async fn stream_turn(
        &self,
        user_message: &str,
        chunk_tx: mpsc::UnboundedSender<String>,
        system_prompt: Option<&str>,
        context: Option<&str>,
    ) -> String {
        let messages = self.prepare_turn(user_message, system_prompt, context).await;

        match self.post_chat_stream(messages, &chunk_tx).await {
            Ok(reply) => {
                self.push_assistant(&reply).await;
                reply
            }
            Err(e) => {
                self.rollback_user().await;
                format!("Error: {e}")
            }
        }
    }

    async fn clear_history(&self) {
        self.transcript.lock().await.clear();
    }

    fn model(&self) -> String {
        self.model_name()
    }

    fn set_model(&self, model: &str) {
        self.set_model_name(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // An unroutable local endpoint: connections are refused immediately,
    // exercising the degrade-to-error-text paths without a server.
    const DEAD_SERVER: &str = "http://127.0.0.1:9";

    #[tokio::test]
    async fn test_prepare_turn_seeds_system_prompt_once() {
        let client = OllamaClient::with_defaults();

        client.prepare_turn("first", Some("be brief"), None).await;
        client.prepare_turn("second", Some("be brief"), None).await;

        let history = client.history().await;
        let system_count = history.iter().filter(|m| m.role == Role::System).count();
        assert_eq!(system_count, 1);
        assert_eq!(history[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_prepare_turn_prefixes_context_as_fenced_block() {
        let client = OllamaClient::with_defaults();

        client
            .prepare_turn("what does this do?", None, Some("fn a() {}"))
            .await;

        let history = client.history().await;
        assert_eq!(history.len(), 1);
        assert!(history[0].content.starts_with("Context:\n```\nfn a() {}\n```"));
        assert!(history[0].content.ends_with("what does this do?"));
    }

    #[tokio::test]
    async fn test_prepare_turn_skips_blank_context() {
        let client = OllamaClient::with_defaults();

        client.prepare_turn("hello", None, Some("   ")).await;

        let history = client.history().await;
        assert_eq!(history[0].content, "hello");
    }

    #[tokio::test]
    async fn test_transcript_grows_monotonically_and_clears() {
        let client = OllamaClient::with_defaults();

        client.prepare_turn("one", None, None).await;
        client.push_assistant("reply one").await;
        client.prepare_turn("two", None, None).await;
        client.push_assistant("reply two").await;

        assert_eq!(client.history().await.len(), 4);

        client.clear_history().await;
        assert!(client.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_returns_error_text_and_rolls_back() {
        let client = OllamaClient::new(DEAD_SERVER, DEFAULT_MODEL);

        let reply = client.send_turn("hello", Some("system"), None).await;

        assert!(reply.starts_with("Error:"), "got: {reply}");
        // The user message of the failed turn must not linger.
        let history = client.history().await;
        assert!(history.iter().all(|m| m.role != Role::User));
    }

    #[tokio::test]
    async fn test_failed_stream_turn_returns_error_text() {
        let client = OllamaClient::new(DEAD_SERVER, DEFAULT_MODEL);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let reply = client.stream_turn("hello", tx, None, None).await;

        assert!(reply.starts_with("Error:"), "got: {reply}");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_list_models_degrades_to_empty_on_failure() {
        let client = OllamaClient::new(DEAD_SERVER, DEFAULT_MODEL);

        assert!(client.list_models().await.is_empty());
    }

    #[tokio::test]
    async fn test_generate_degrades_to_error_text() {
        let client = OllamaClient::new(DEAD_SERVER, DEFAULT_MODEL);

        let reply = client.generate("prompt", "context").await;
        assert!(reply.starts_with("Error:"), "got: {reply}");
    }

    #[test]
    fn test_model_selection() {
        let client = OllamaClient::with_defaults();
        assert_eq!(client.model(), DEFAULT_MODEL);

        client.set_model("mistral");
        assert_eq!(client.model(), "mistral");
    }
}
