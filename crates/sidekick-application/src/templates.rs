//! Built-in code generation templates.
//!
//! Each template pairs a specialized system prompt with a user prompt
//! carrying a `{code}` placeholder, plus the mode it works best in.

use sidekick_core::context::truncate_payload;
use sidekick_core::mode::InteractionMode;

/// A reusable code generation template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTemplate {
    /// Unique identifier for the template.
    pub id: &'static str,
    /// Display name for the template.
    pub name: &'static str,
    /// Brief description of what the template does.
    pub description: &'static str,
    /// Category for grouping templates.
    pub category: &'static str,
    /// System prompt to use with this template.
    pub system_prompt: &'static str,
    /// User prompt template with a `{code}` placeholder.
    pub user_prompt_template: &'static str,
    /// Whether this template requires a code selection.
    pub requires_selection: bool,
    /// Recommended mode for this template.
    pub recommended_mode: InteractionMode,
}

impl CodeTemplate {
    /// Substitutes the code into the user prompt, applying the shared
    /// truncation rule.
    pub fn render_user_prompt(&self, code: &str) -> String {
        self.user_prompt_template
            .replace("{code}", &truncate_payload(code))
    }
}

const BUILT_IN_TEMPLATES: &[CodeTemplate] = &[
    CodeTemplate {
        id: "unittest",
        name: "Generate Unit Tests",
        description: "Creates comprehensive unit tests for selected code",
        category: "Testing",
        system_prompt: "You are an expert at writing unit tests. Generate comprehensive unit \
            tests using the idiomatic test framework for the code's language. Include edge \
            cases, error scenarios, and test doubles where needed. Follow testing best practices.",
        user_prompt_template: "Generate unit tests for this code:\n\n{code}\n\nInclude:\n\
            - Happy path tests\n- Edge case tests\n- Error handling tests\n- Mock setup if needed",
        requires_selection: true,
        recommended_mode: InteractionMode::Agent,
    },
    CodeTemplate {
        id: "documentation",
        name: "Generate Documentation",
        description: "Creates documentation comments",
        category: "Documentation",
        system_prompt: "You are an expert at writing clear, comprehensive code documentation. \
            Generate documentation comments following the conventions of the code's language. \
            Describe purpose, parameters, return values, and failure modes where appropriate.",
        user_prompt_template: "Generate documentation comments for this code:\n\n{code}\n\n\
            Include clear descriptions, parameter explanations, return value details, and \
            usage examples.",
        requires_selection: true,
        recommended_mode: InteractionMode::Agent,
    },
    CodeTemplate {
        id: "logging",
        name: "Add Logging",
        description: "Adds comprehensive logging statements",
        category: "Debugging",
        system_prompt: "You are an expert at adding appropriate logging to code. Use the \
            idiomatic logging facility for the code's language. Add informational logs for \
            key operations, warnings for potential issues, and error logs on failure paths. \
            Include relevant context in log messages.",
        user_prompt_template: "Add comprehensive logging to this code:\n\n{code}\n\nInclude:\n\
            - Entry/exit logging for key operations\n- Warnings for edge cases\n\
            - Error logs on failure paths",
        requires_selection: true,
        recommended_mode: InteractionMode::Agent,
    },
    CodeTemplate {
        id: "async",
        name: "Convert to Async",
        description: "Converts synchronous code to asynchronous",
        category: "Refactoring",
        system_prompt: "You are an expert at asynchronous programming patterns. Convert \
            synchronous code to the idiomatic async style of its language: update signatures, \
            propagate awaits correctly, and handle cancellation where the language supports it.",
        user_prompt_template: "Convert this code to asynchronous style:\n\n{code}\n\nEnsure:\n\
            - Proper async signatures\n- Correct await propagation\n- Idiomatic naming conventions",
        requires_selection: true,
        recommended_mode: InteractionMode::Agent,
    },
    CodeTemplate {
        id: "errorhandling",
        name: "Add Error Handling",
        description: "Adds comprehensive error handling",
        category: "Quality",
        system_prompt: "You are an expert at defensive programming and error handling. Add \
            input validation and idiomatic error propagation with meaningful error messages. \
            Handle specific failure cases explicitly.",
        user_prompt_template: "Add comprehensive error handling to this code:\n\n{code}\n\n\
            Include:\n- Input validation\n- Explicit failure cases\n- Meaningful error messages",
        requires_selection: true,
        recommended_mode: InteractionMode::Agent,
    },
    CodeTemplate {
        id: "performance",
        name: "Optimize Performance",
        description: "Suggests performance improvements",
        category: "Quality",
        system_prompt: "You are an expert at performance optimization. Analyze the code for \
            algorithmic complexity, unnecessary allocations, and redundant work, and suggest \
            concrete improvements without changing observable behavior.",
        user_prompt_template: "Analyze this code for performance and suggest optimizations:\n\n\
            {code}\n\nFocus on:\n- Algorithmic complexity\n- Allocation patterns\n- Redundant work",
        requires_selection: true,
        recommended_mode: InteractionMode::Ask,
    },
];

/// Registry of the built-in templates.
pub struct TemplateRegistry;

impl TemplateRegistry {
    /// All built-in templates.
    pub fn all() -> &'static [CodeTemplate] {
        BUILT_IN_TEMPLATES
    }

    /// Looks up a template by id.
    pub fn get(id: &str) -> Option<&'static CodeTemplate> {
        BUILT_IN_TEMPLATES.iter().find(|t| t.id == id)
    }

    /// Templates in a given category.
    pub fn by_category(category: &str) -> Vec<&'static CodeTemplate> {
        BUILT_IN_TEMPLATES
            .iter()
            .filter(|t| t.category == category)
            .collect()
    }
}
