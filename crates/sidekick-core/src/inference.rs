//! Inference service boundary.
//!
//! The concrete client lives in `sidekick-interaction`; the session
//! orchestrator depends on this trait so a turn can be driven against a
//! scripted fake in tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A client to a chat-completion inference server.
///
/// Implementations own the linear conversation transcript submitted on
/// every turn. Failure semantics are degrade-not-throw: network or
/// protocol errors come back as an `"Error: <message>"` reply string, and
/// model discovery failures yield an empty list.
///
/// Concurrent turns on one instance are to be serialized by the caller;
/// the transcript append is only guaranteed consistent for sequential use.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Queries the server's model catalog. Returns an empty list on any
    /// network or parse failure (discovery failure is non-fatal).
    async fn list_models(&self) -> Vec<String>;

    /// Runs one non-streaming turn: appends the system prompt (once, only
    /// if the transcript lacks one) and the user message (context prefixed
    /// as a fenced block), submits the full transcript, appends the reply,
    /// and returns it.
    async fn send_turn(
        &self,
        user_message: &str,
        system_prompt: Option<&str>,
        context: Option<&str>,
    ) -> String;

    /// Like [`send_turn`](Self::send_turn), but each incrementally decoded
    /// chunk is delivered on `chunk_tx` as it arrives. Chunks are sent from
    /// whatever task the transport runs on; consumers needing UI-thread
    /// affinity marshal themselves. Returns the fully concatenated text.
    async fn stream_turn(
        &self,
        user_message: &str,
        chunk_tx: mpsc::UnboundedSender<String>,
        system_prompt: Option<&str>,
        context: Option<&str>,
    ) -> String;

    /// Empties the transcript (used when starting a new conversation).
    async fn clear_history(&self);

    /// The model name submitted with each request.
    fn model(&self) -> String;

    /// Selects the model for subsequent requests.
    fn set_model(&self, model: &str);
}
