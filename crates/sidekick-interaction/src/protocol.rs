//! Wire types for the Ollama HTTP API.
//!
//! Endpoints used:
//! - `GET /api/tags` — model catalog
//! - `POST /api/chat` — chat completion, streaming (newline-delimited
//!   JSON) and non-streaming
//! - `POST /api/generate` — legacy single-shot completion

use serde::{Deserialize, Serialize};

/// Role of a transcript message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of the transcript submitted with every chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
}

impl TranscriptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// `POST /api/chat` request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<TranscriptMessage>,
    pub stream: bool,
}

/// `POST /api/chat` non-streaming response body.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: TranscriptMessage,
    #[serde(default)]
    pub done: bool,
}

/// One newline-delimited object of a streaming chat response.
///
/// The stream is terminated by an object with `done: true`; `message` may
/// be absent on the terminator.
#[derive(Debug, Deserialize)]
pub struct ChatStreamDelta {
    #[serde(default)]
    pub message: Option<DeltaContent>,
    #[serde(default)]
    pub done: bool,
}

/// Incremental message payload inside a stream delta.
#[derive(Debug, Default, Deserialize)]
pub struct DeltaContent {
    #[serde(default)]
    pub content: String,
}

/// `GET /api/tags` response body.
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// One entry of the model catalog.
#[derive(Debug, Deserialize)]
pub struct ModelTag {
    #[serde(default)]
    pub name: String,
}

/// `POST /api/generate` request body (legacy single-shot path).
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// `POST /api/generate` response body.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}
