//! Context-aware prompt construction for the command surface.
//!
//! Every builder shares the per-payload truncation rule from the context
//! module, so a pathological selection can never blow up a prompt.

use sidekick_core::context::truncate_payload;

/// Builds prompts for the editor commands and ad-hoc questions.
pub struct PromptBuilder;

impl PromptBuilder {
    fn language_info(language: Option<&str>) -> String {
        match language {
            Some(language) if !language.is_empty() => format!(" ({language})"),
            _ => String::new(),
        }
    }

    /// Prompt for asking a question about a piece of code.
    pub fn ask(question: &str, code_context: &str, language: Option<&str>) -> String {
        let mut prompt = String::new();

        if !code_context.is_empty() {
            prompt.push_str(&format!(
                "Code context{}:\n```\n{}\n```\n\n",
                Self::language_info(language),
                truncate_payload(code_context)
            ));
        }

        prompt.push_str(&format!("Question: {question}\n"));
        prompt
    }

    /// Prompt for an agent-mode modification request.
    pub fn modify(request: &str, code_context: &str, language: Option<&str>) -> String {
        let mut prompt = String::new();
        prompt.push_str("I need you to modify the following code according to this request:\n\n");
        prompt.push_str(&format!("**Request:** {request}\n\n"));

        if let Some(language) = language.filter(|l| !l.is_empty()) {
            prompt.push_str(&format!("**Language:** {language}\n\n"));
        }

        prompt.push_str(&format!(
            "**Current Code:**\n```\n{}\n```\n\n",
            truncate_payload(code_context)
        ));
        prompt.push_str("Please provide the complete modified code in a code block, and explain your changes.\n");
        prompt
    }

    /// Prompt for explaining selected code.
    pub fn explain(code: &str, language: Option<&str>) -> String {
        format!(
            "Please explain the following code{}:\n```\n{}\n```\n",
            Self::language_info(language),
            truncate_payload(code)
        )
    }

    /// Prompt for refactoring suggestions.
    pub fn refactor(code: &str, language: Option<&str>) -> String {
        let mut prompt = format!(
            "Please suggest refactoring improvements for the following code{}:\n```\n{}\n```\n\n",
            Self::language_info(language),
            truncate_payload(code)
        );
        prompt.push_str("Focus on:\n");
        prompt.push_str("- Code readability\n");
        prompt.push_str("- Performance optimization\n");
        prompt.push_str("- Best practices\n");
        prompt.push_str("- Maintainability\n");
        prompt
    }

    /// Prompt for finding issues in code.
    pub fn find_issues(code: &str, language: Option<&str>) -> String {
        let mut prompt = format!(
            "Please analyze the following code{} for potential issues:\n```\n{}\n```\n\n",
            Self::language_info(language),
            truncate_payload(code)
        );
        prompt.push_str("Look for:\n");
        prompt.push_str("- Syntax errors\n");
        prompt.push_str("- Logic bugs\n");
        prompt.push_str("- Security vulnerabilities\n");
        prompt.push_str("- Performance issues\n");
        prompt.push_str("- Code smells\n");
        prompt
    }

    /// Prompt for generating documentation.
    pub fn document(code: &str, language: Option<&str>) -> String {
        let mut prompt = format!(
            "Please generate comprehensive documentation for the following code{}:\n```\n{}\n```\n\n",
            Self::language_info(language),
            truncate_payload(code)
        );
        prompt.push_str("Include:\n");
        prompt.push_str("- Purpose and functionality\n");
        prompt.push_str("- Parameters and return values\n");
        prompt.push_str("- Usage examples\n");
        prompt
    }

    /// Prompt for generating code from requirements.
    pub fn generate(requirements: &str, language: &str, existing_context: &str) -> String {
        let mut prompt = format!("Generate {language} code based on these requirements:\n\n{requirements}\n\n");

        if !existing_context.is_empty() {
            prompt.push_str(&format!(
                "Existing code context:\n```\n{}\n```\n\n",
                truncate_payload(existing_context)
            ));
        }

        prompt.push_str("Provide:\n");
        prompt.push_str("- Complete, working code\n");
        prompt.push_str("- Inline comments for complex logic\n");
        prompt.push_str("- Following best practices and conventions\n");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_core::context::{MAX_CONTEXT_CHARS, TRUNCATION_MARKER};

    #[test]
    fn test_ask_without_context_is_question_only() {
        let prompt = PromptBuilder::ask("why?", "", None);
        assert_eq!(prompt, "Question: why?\n");
    }

    #[test]
    fn test_ask_includes_language_hint() {
        let prompt = PromptBuilder::ask("why?", "fn a() {}", Some("rust"));
        assert!(prompt.contains("Code context (rust):"));
        assert!(prompt.contains("fn a() {}"));
    }

    #[test]
    fn test_explain_truncates_oversized_code() {
        let oversized = "z".repeat(MAX_CONTEXT_CHARS + 100);
        let prompt = PromptBuilder::explain(&oversized, None);

        assert!(prompt.contains(TRUNCATION_MARKER.trim()));
        assert!(prompt.chars().count() < oversized.chars().count() + 200);
    }

    #[test]
    fn test_modify_carries_request_and_code() {
        let prompt = PromptBuilder::modify("add logging", "fn a() {}", Some("rust"));
        assert!(prompt.contains("**Request:** add logging"));
        assert!(prompt.contains("**Language:** rust"));
        assert!(prompt.contains("fn a() {}"));
    }

    #[test]
    fn test_find_issues_lists_categories() {
        let prompt = PromptBuilder::find_issues("x", None);
        assert!(prompt.contains("Security vulnerabilities"));
        assert!(prompt.contains("Logic bugs"));
    }
}
