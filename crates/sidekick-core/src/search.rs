//! Code search boundary.
//!
//! Solution/project indexing lives in the host; the core consumes it as a
//! best-effort capability returning symbol records for the context picker.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The kind of code element a search result points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    File,
    Class,
    Method,
    Property,
    Interface,
    Project,
}

/// One code-search result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSymbol {
    /// Name shown in the search picker.
    pub display_name: String,
    /// Source file, when the element has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Element text, when the host can materialize it cheaply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Best-effort code search over the open solution.
///
/// Implementations return an empty list on any failure rather than raising.
#[async_trait]
pub trait CodeSearch: Send + Sync {
    /// Searches all projects and files for elements matching the query.
    async fn search(&self, query: &str) -> Vec<CodeSymbol>;

    /// Lists all files in the solution.
    async fn all_files(&self) -> Vec<CodeSymbol>;
}
