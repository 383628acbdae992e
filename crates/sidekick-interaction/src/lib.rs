//! Sidekick interaction: the inference client.
//!
//! Talks to a locally hosted Ollama server over HTTP: model discovery,
//! streaming and non-streaming chat completion, and maintenance of the
//! linear conversation transcript sent on every turn.

pub mod ollama_client;
pub mod protocol;

pub use ollama_client::{DEFAULT_MODEL, DEFAULT_SERVER_URL, OllamaClient};
pub use protocol::{Role, TranscriptMessage};
