//! Parsing of raw completion text into typed chat messages.
//!
//! The parser scans markdown-style fenced code regions (triple backticks
//! with an optional language tag), extracts them as [`CodeBlock`]s, and
//! produces the prose-only rendering used for display.

use once_cell::sync::Lazy;
use regex::Regex;

use super::message::{ChatMessage, CodeBlock};

/// Matches one fenced code block: ```` ```lang\n...\n``` ````.
/// The language tag is optional; the body match is non-greedy so multiple
/// blocks in one message are matched independently, in document order.
static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w+)?\s*\n(.*?)\n```").expect("valid code block regex"));

/// Matches an opening fence (used for the cheap "contains code" check).
static OPENING_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(\w+)?\s*\n").expect("valid fence regex"));

/// Matches runs of three or more newlines left behind by fence removal.
static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank run regex"));

/// Parser for chat messages exchanged with the model.
pub struct MessageParser;

impl MessageParser {
    /// Parses raw text into a [`ChatMessage`].
    ///
    /// Only assistant messages are scanned for code blocks; user input is
    /// taken verbatim.
    pub fn parse(content: &str, is_user: bool) -> ChatMessage {
        let mut message = ChatMessage::new(content, is_user);

        if !is_user {
            message.code_blocks = Self::extract_code_blocks(content);
            message.has_code_blocks = !message.code_blocks.is_empty();
        }

        message
    }

    /// Extracts all fenced code blocks from markdown-formatted text.
    ///
    /// Matching is non-overlapping and processed in document order. The
    /// language tag defaults to `"text"` when absent or empty.
    pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
        if text.is_empty() {
            return Vec::new();
        }

        CODE_BLOCK_RE
            .captures_iter(text)
            .map(|caps| {
                let whole = caps.get(0).expect("match group 0 always present");
                let language = caps
                    .get(1)
                    .map(|m| m.as_str())
                    .filter(|s| !s.is_empty())
                    .unwrap_or("text");
                let code = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

                CodeBlock::new(language, code, whole.start(), whole.end())
            })
            .collect()
    }

    /// Returns the prose-only rendering of a message: all fenced blocks
    /// removed, runs of blank lines collapsed, surrounding whitespace
    /// trimmed. Messages without code blocks are returned unchanged.
    pub fn display_content(message: &ChatMessage) -> String {
        if !message.has_code_blocks {
            return message.content.clone();
        }

        let stripped = CODE_BLOCK_RE.replace_all(&message.content, "");
        let collapsed = BLANK_RUN_RE.replace_all(&stripped, "\n\n");
        collapsed.trim().to_string()
    }

    /// Returns the explanation text of a response: fenced blocks are
    /// replaced with a `[CODE BLOCK]` placeholder so the surrounding prose
    /// keeps its shape.
    pub fn explanation_text(raw: &str) -> String {
        CODE_BLOCK_RE.replace_all(raw, "[CODE BLOCK]").trim().to_string()
    }

    /// Cheap check for the presence of an opening fence, without running
    /// full extraction.
    pub fn contains_code_blocks(raw: &str) -> bool {
        OPENING_FENCE_RE.is_match(raw)
    }

    /// True iff the message is an assistant message with at least one code
    /// block. Pure classification, no side effects.
    pub fn is_actionable(message: &ChatMessage) -> bool {
        message.is_actionable()
    }

    /// Formats code for display with right-aligned line numbers.
    pub fn format_with_line_numbers(code: &str) -> String {
        if code.is_empty() {
            return code.to_string();
        }

        code.lines()
            .enumerate()
            .map(|(i, line)| format!("{:4} | {}", i + 1, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
