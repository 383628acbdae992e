//! Session events delivered to the UI.
//!
//! The orchestrator publishes onto an unbounded channel; the host UI
//! consumes on its own thread and marshals to UI-affine state itself.

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use sidekick_core::chat::ChatMessage;
use sidekick_core::mode::InteractionMode;

/// High-level events published by the session orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A message was appended to the transcript.
    MessageAppended { message: ChatMessage },
    /// A streaming turn started; show a loading indicator until the first
    /// chunk arrives.
    StreamStarted,
    /// One incrementally decoded chunk of the in-flight response.
    StreamChunk { content: String },
    /// The turn finished; carries the final assistant message.
    TurnCompleted { message: ChatMessage },
    /// The turn failed mid-flight; a synthetic error message was appended.
    TurnFailed { error: String },
    /// The interaction mode changed.
    ModeChanged { mode: InteractionMode },
    /// The pending-edit set was mutated; carries the new size.
    PendingEditsChanged { count: usize },
    /// The attached context set changed.
    ContextChanged {
        reference_count: usize,
        token_estimate: u32,
    },
    /// A new conversation was started.
    ConversationStarted { id: Uuid },
    /// The model catalog was refreshed.
    ModelsRefreshed { models: Vec<String> },
    /// Free-form status line for the panel footer.
    Status { text: String },
}

pub type SessionEventSender = mpsc::UnboundedSender<SessionEvent>;
pub type SessionEventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Creates the event channel connecting the orchestrator to the UI.
pub fn session_event_channel() -> (SessionEventSender, SessionEventReceiver) {
    mpsc::unbounded_channel()
}
