//! Interaction modes and the pending-edit tracker.
//!
//! The tracker is the single owner of the current [`InteractionMode`] and
//! of the flat collection of not-yet-resolved edit proposals. Every
//! mutation notifies registered observers; mode changes never reset the
//! pending set or the transcript.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::edit::{CodeEdit, ScratchPair};

/// The interaction mode of the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Read-only Q&A about code, explanations, and guidance.
    #[default]
    Ask,
    /// Active code editing: responses are scanned for extractable edits.
    Agent,
}

impl std::fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionMode::Ask => write!(f, "Ask"),
            InteractionMode::Agent => write!(f, "Agent"),
        }
    }
}

const ASK_SYSTEM_PROMPT: &str = "\
You are an expert programming assistant. Your role is to:
- Answer questions about code clearly and concisely
- Explain programming concepts and best practices
- Provide guidance on debugging and optimization
- Suggest improvements WITHOUT modifying code directly
- Use code examples for illustration but mark them as examples

Format code examples in markdown code blocks with language tags.
Be helpful, accurate, and professional.";

const AGENT_SYSTEM_PROMPT: &str = "\
You are a code editing AI assistant. Your CRITICAL RULES:

1. ALWAYS provide COMPLETE, WORKING code in markdown code blocks
2. NEVER use ellipsis (...) or comments like '// rest of code here'
3. NEVER omit ANY part of the code
4. ALWAYS include ALL imports, functions, types, and declarations
5. Format as: ```language\n[COMPLETE CODE]\n```

RESPONSE FORMAT:
[Brief explanation of what you're changing]

```language
[COMPLETE, WORKING CODE - include everything, no shortcuts]
```

[Explanation of specific changes]

Remember: the user needs COMPLETE, compilable code to apply the changes!";

/// Notification payloads delivered to tracker observers.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// The interaction mode changed.
    ModeChanged(InteractionMode),
    /// The pending-edit set was mutated; carries the new size.
    PendingEditsChanged(usize),
}

/// Observer callback registered with [`ModeTracker::subscribe`].
pub type TrackerObserver = Arc<dyn Fn(&TrackerEvent) + Send + Sync>;

/// Owns the interaction mode and the pending-edit set.
pub struct ModeTracker {
    mode: RwLock<InteractionMode>,
    pending: RwLock<Vec<CodeEdit>>,
    observers: RwLock<Vec<TrackerObserver>>,
}

impl ModeTracker {
    pub fn new() -> Self {
        Self {
            mode: RwLock::new(InteractionMode::Ask),
            pending: RwLock::new(Vec::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Registers an observer invoked synchronously on every mutation.
    pub fn subscribe(&self, observer: TrackerObserver) {
        self.observers.write().expect("observer lock").push(observer);
    }

    fn notify(&self, event: TrackerEvent) {
        let observers = self.observers.read().expect("observer lock");
        for observer in observers.iter() {
            observer(&event);
        }
    }

    pub fn mode(&self) -> InteractionMode {
        *self.mode.read().expect("mode lock")
    }

    /// Switches modes on explicit user action. Firing only on an actual
    /// change; existing pending edits and the transcript are untouched.
    pub fn set_mode(&self, mode: InteractionMode) {
        let changed = {
            let mut current = self.mode.write().expect("mode lock");
            let changed = *current != mode;
            *current = mode;
            changed
        };
        if changed {
            self.notify(TrackerEvent::ModeChanged(mode));
        }
    }

    pub fn switch_to_ask(&self) {
        self.set_mode(InteractionMode::Ask);
    }

    pub fn switch_to_agent(&self) {
        self.set_mode(InteractionMode::Agent);
    }

    pub fn is_ask(&self) -> bool {
        self.mode() == InteractionMode::Ask
    }

    pub fn is_agent(&self) -> bool {
        self.mode() == InteractionMode::Agent
    }

    /// The fixed instructional template for the current mode.
    pub fn system_prompt(&self) -> &'static str {
        Self::system_prompt_for(self.mode())
    }

    /// The fixed instructional template for a given mode.
    pub fn system_prompt_for(mode: InteractionMode) -> &'static str {
        match mode {
            InteractionMode::Ask => ASK_SYSTEM_PROMPT,
            InteractionMode::Agent => AGENT_SYSTEM_PROMPT,
        }
    }

    /// Registers a pending edit. Edits already marked applied are rejected:
    /// the pending set never contains an applied edit.
    pub fn add(&self, edit: CodeEdit) {
        if edit.applied {
            return;
        }
        self.pending.write().expect("pending lock").push(edit);
        self.notify_pending_changed();
    }

    /// Removes (discards) a pending edit. Removing an unknown id is a
    /// no-op; returns whether anything was removed.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = {
            let mut pending = self.pending.write().expect("pending lock");
            let before = pending.len();
            pending.retain(|e| e.id != id);
            pending.len() != before
        };
        if removed {
            self.notify_pending_changed();
        }
        removed
    }

    /// Marks an edit applied and removes it from the pending set in one
    /// logical operation. Returns the resolved edit, or `None` when the id
    /// was already resolved (second resolutions are no-ops).
    pub fn mark_applied(&self, id: Uuid) -> Option<CodeEdit> {
        let resolved = {
            let mut pending = self.pending.write().expect("pending lock");
            let index = pending.iter().position(|e| e.id == id)?;
            let mut edit = pending.remove(index);
            edit.applied = true;
            Some(edit)
        };
        if resolved.is_some() {
            self.notify_pending_changed();
        }
        resolved
    }

    /// Discards all pending edits.
    pub fn clear(&self) {
        let had_any = {
            let mut pending = self.pending.write().expect("pending lock");
            let had_any = !pending.is_empty();
            pending.clear();
            had_any
        };
        if had_any {
            self.notify_pending_changed();
        }
    }

    /// Snapshot of the pending set, in insertion order.
    pub fn list(&self) -> Vec<CodeEdit> {
        self.pending.read().expect("pending lock").clone()
    }

    /// Looks up a single pending edit by id.
    pub fn get(&self, id: Uuid) -> Option<CodeEdit> {
        self.pending
            .read()
            .expect("pending lock")
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Records (or clears) the scratch pair backing an edit's external
    /// diff view. Scratch paths are session-local display state, not a
    /// pending-set mutation, so no notification fires. Returns whether
    /// the edit was found.
    pub fn set_scratch(&self, id: Uuid, scratch: Option<ScratchPair>) -> bool {
        let mut pending = self.pending.write().expect("pending lock");
        match pending.iter_mut().find(|e| e.id == id) {
            Some(edit) => {
                edit.scratch = scratch;
                true
            }
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.read().expect("pending lock").len()
    }

    fn notify_pending_changed(&self) {
        let count = self.pending_count();
        self.notify(TrackerEvent::PendingEditsChanged(count));
    }
}

impl Default for ModeTracker {
    fn default() -> Self {
        Self::new()
    }
}
