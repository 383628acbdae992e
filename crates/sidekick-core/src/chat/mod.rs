//! Chat domain module.
//!
//! Message and conversation models plus the parser that turns raw model
//! output into typed messages.

mod conversation;
mod message;
mod parser;

pub use conversation::Conversation;
pub use message::{ChatMessage, CodeBlock};
pub use parser::MessageParser;
