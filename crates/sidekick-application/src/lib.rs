//! Sidekick application: the session orchestrator and command surface.
//!
//! Binds the inference client, context assembler, response parsing, edit
//! extraction, the mode & pending-edit tracker, and the persistence stores
//! together per user turn, and exposes the commands the host IDE's panel
//! invokes.

pub mod events;
pub mod prompts;
pub mod search;
pub mod session;
pub mod templates;

#[cfg(test)]
mod session_test;

pub use crate::events::{
    SessionEvent, SessionEventReceiver, SessionEventSender, session_event_channel,
};
pub use crate::prompts::PromptBuilder;
pub use crate::search::ContextSearchCoordinator;
pub use crate::session::ChatSession;
pub use crate::templates::{CodeTemplate, TemplateRegistry};
