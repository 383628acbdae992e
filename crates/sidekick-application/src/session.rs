//! The session orchestrator.
//!
//! `ChatSession` binds the inference client, context assembler, response
//! parsing, edit extraction, the mode & pending-edit tracker, and the
//! persistence stores together, one turn at a time. Turns are strictly
//! sequential per session; an internal guard serializes submissions so the
//! client's transcript append stays consistent.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use sidekick_core::SidekickError;
use sidekick_core::chat::{Conversation, MessageParser};
use sidekick_core::context::{
    ContextAssembler, ContextKind, ContextReference, DocumentSnapshot,
};
use sidekick_core::edit::{CodeEdit, EditBuilder, ScratchPair};
use sidekick_core::editor::EditorAccess;
use sidekick_core::inference::InferenceService;
use sidekick_core::mode::{InteractionMode, ModeTracker, TrackerEvent};
use sidekick_core::repository::{ConversationRepository, EditStore};
use sidekick_core::search::{CodeSymbol, SymbolKind};

use sidekick_infrastructure::ScratchMaterializer;

use crate::events::{SessionEvent, SessionEventSender};
use crate::prompts::PromptBuilder;
use crate::templates::TemplateRegistry;

/// One chat session: the control logic behind the assistant panel.
pub struct ChatSession {
    inference: Arc<dyn InferenceService>,
    editor: Arc<dyn EditorAccess>,
    tracker: Arc<ModeTracker>,
    edit_store: Arc<dyn EditStore>,
    archive: Arc<dyn ConversationRepository>,
    assembler: Mutex<ContextAssembler>,
    conversation: Mutex<Conversation>,
    events: SessionEventSender,
    /// Serializes turns: a new turn must not start while one is in flight.
    turn_guard: Mutex<()>,
    scratch: Option<ScratchMaterializer>,
}

impl ChatSession {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        editor: Arc<dyn EditorAccess>,
        tracker: Arc<ModeTracker>,
        edit_store: Arc<dyn EditStore>,
        archive: Arc<dyn ConversationRepository>,
        events: SessionEventSender,
    ) -> Self {
        // Forward tracker notifications onto the session event channel.
        let event_sink = events.clone();
        tracker.subscribe(Arc::new(move |event| {
            let forwarded = match event {
                TrackerEvent::ModeChanged(mode) => SessionEvent::ModeChanged { mode: *mode },
                TrackerEvent::PendingEditsChanged(count) => {
                    SessionEvent::PendingEditsChanged { count: *count }
                }
            };
            let _ = event_sink.send(forwarded);
        }));

        let conversation = Conversation::new(tracker.mode());
        Self {
            inference,
            editor,
            tracker,
            edit_store,
            archive,
            assembler: Mutex::new(ContextAssembler::new()),
            conversation: Mutex::new(conversation),
            events,
            turn_guard: Mutex::new(()),
            scratch: None,
        }
    }

    /// Attaches a scratch materializer so pending edits can be opened in
    /// an external diff viewer.
    pub fn with_scratch_materializer(mut self, materializer: ScratchMaterializer) -> Self {
        self.scratch = Some(materializer);
        self
    }

    // ------------------------------------------------------------------
    // Turn execution
    // ------------------------------------------------------------------

    /// Sends a user message through the full turn pipeline.
    ///
    /// Empty or whitespace-only input is a no-op that mutates nothing.
    pub async fn send_message(&self, input: &str) {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return;
        }
        self.submit(trimmed.to_string(), None).await;
    }

    /// Runs one turn with an optional system-prompt override (used by the
    /// template commands).
    async fn submit(&self, prompt: String, system_override: Option<String>) {
        let _guard = self.turn_guard.lock().await;

        if let Err(e) = self.run_turn(&prompt, system_override.as_deref()).await {
            // The UI drops its streaming placeholder on TurnFailed; the
            // failure itself lands in the transcript as a synthetic error
            // message. Mode and tracker state are left untouched - no
            // partial edits are ever registered from a failed turn.
            let error_message = MessageParser::parse(&format!("Error: {e}"), false);
            {
                let mut conversation = self.conversation.lock().await;
                conversation.push_message(error_message.clone());
            }
            let _ = self.events.send(SessionEvent::TurnFailed {
                error: e.to_string(),
            });
            let _ = self.events.send(SessionEvent::TurnCompleted {
                message: error_message,
            });
        }
    }

    async fn run_turn(
        &self,
        prompt: &str,
        system_override: Option<&str>,
    ) -> Result<(), SidekickError> {
        // User messages are classified only, never scanned for code.
        let user_message = MessageParser::parse(prompt, true);
        {
            let mut conversation = self.conversation.lock().await;
            let first_turn = conversation.messages.is_empty();
            conversation.push_message(user_message.clone());
            if first_turn {
                conversation.derive_title();
            }
        }
        let _ = self.events.send(SessionEvent::MessageAppended {
            message: user_message,
        });

        let system_prompt = system_override
            .map(str::to_string)
            .unwrap_or_else(|| self.tracker.system_prompt().to_string());

        // Attached references first, live document/selection as fallback.
        let snapshot = self.capture_snapshot().await;
        let context = {
            let mut assembler = self.assembler.lock().await;
            assembler.set_snapshot(snapshot.clone());
            assembler.build_context()
        };
        let context = (!context.is_empty()).then_some(context);

        let _ = self.events.send(SessionEvent::StreamStarted);

        // The client produces chunks onto the channel from the transport
        // task; this pump forwards them to the UI without blocking the
        // transport from delivering the next chunk.
        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
        let event_sink = self.events.clone();
        let pump = tokio::spawn(async move {
            while let Some(content) = chunk_rx.recv().await {
                let _ = event_sink.send(SessionEvent::StreamChunk { content });
            }
        });

        let reply = self
            .inference
            .stream_turn(prompt, chunk_tx, Some(&system_prompt), context.as_deref())
            .await;
        let _ = pump.await;

        let mut assistant_message = MessageParser::parse(&reply, false);
        assistant_message.model_name = Some(self.inference.model());

        // Only Agent-mode responses are scanned for extractable edits.
        if self.tracker.is_agent() && assistant_message.is_actionable() {
            let original = snapshot.edit_target_text().unwrap_or_default().to_string();
            if let Some(edit) =
                EditBuilder::build_edit(&reply, &original, snapshot.file_path.clone())
            {
                if EditBuilder::validate(&edit) {
                    assistant_message.edit_id = Some(edit.id);
                    self.tracker.add(edit);
                    self.persist_pending().await;
                }
            }
        }

        {
            let mut conversation = self.conversation.lock().await;
            if conversation.model.is_none() {
                conversation.model = Some(self.inference.model());
            }
            conversation.push_message(assistant_message.clone());
        }
        self.archive_current().await;

        let _ = self.events.send(SessionEvent::TurnCompleted {
            message: assistant_message,
        });
        Ok(())
    }

    async fn capture_snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            document: self.editor.active_document_text().await,
            selection: self.editor.selected_text().await,
            language: self.editor.active_document_language().await,
            file_path: self.editor.active_document_path().await,
        }
    }

    /// Best-effort snapshot of the pending set to disk. Persistence is a
    /// convenience; failures are logged, never surfaced.
    async fn persist_pending(&self) {
        let pending = self.tracker.list();
        if let Err(e) = self.edit_store.save_all(&pending).await {
            tracing::warn!("failed to persist pending edits: {e}");
        }
    }

    /// Write-through archive of the active conversation.
    async fn archive_current(&self) {
        let record = self.conversation.lock().await.clone();
        if let Err(e) = self.archive.save(&record).await {
            tracing::warn!("failed to archive conversation: {e}");
        }
    }

    // ------------------------------------------------------------------
    // Editor commands
    // ------------------------------------------------------------------

    /// "Explain selected code" command.
    pub async fn explain_selection(&self) {
        if let Some((code, language)) = self.selection_with_language().await {
            self.submit(PromptBuilder::explain(&code, language.as_deref()), None)
                .await;
        }
    }

    /// "Refactor selected code" command.
    pub async fn refactor_selection(&self) {
        if let Some((code, language)) = self.selection_with_language().await {
            self.submit(PromptBuilder::refactor(&code, language.as_deref()), None)
                .await;
        }
    }

    /// "Find issues in selected code" command.
    pub async fn find_issues_in_selection(&self) {
        if let Some((code, language)) = self.selection_with_language().await {
            self.submit(PromptBuilder::find_issues(&code, language.as_deref()), None)
                .await;
        }
    }

    /// Runs a built-in code template against the selection (or the whole
    /// document when the template allows it). Returns whether a turn ran.
    pub async fn run_template(&self, template_id: &str) -> bool {
        let Some(template) = TemplateRegistry::get(template_id) else {
            let _ = self.events.send(SessionEvent::Status {
                text: format!("Unknown template: {template_id}"),
            });
            return false;
        };

        let selection = self.editor.selected_text().await.filter(|s| !s.is_empty());
        let code = match selection {
            Some(selection) => selection,
            None if !template.requires_selection => {
                self.editor.active_document_text().await.unwrap_or_default()
            }
            None => {
                let _ = self.events.send(SessionEvent::Status {
                    text: "Select some code first".to_string(),
                });
                return false;
            }
        };

        let prompt = template.render_user_prompt(&code);
        self.submit(prompt, Some(template.system_prompt.to_string()))
            .await;
        true
    }

    async fn selection_with_language(&self) -> Option<(String, Option<String>)> {
        let selection = self.editor.selected_text().await.filter(|s| !s.is_empty());
        match selection {
            Some(selection) => {
                let language = self.editor.active_document_language().await;
                Some((selection, language))
            }
            None => {
                let _ = self.events.send(SessionEvent::Status {
                    text: "Select some code first".to_string(),
                });
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Mode & pending edits
    // ------------------------------------------------------------------

    pub fn mode(&self) -> InteractionMode {
        self.tracker.mode()
    }

    /// Switches the interaction mode. Pending edits and the transcript are
    /// unaffected.
    pub async fn set_mode(&self, mode: InteractionMode) {
        self.tracker.set_mode(mode);
        self.conversation.lock().await.mode = mode;
    }

    pub fn pending_edits(&self) -> Vec<CodeEdit> {
        self.tracker.list()
    }

    /// Renders the reviewable preview of a pending edit.
    pub fn preview_edit(&self, id: Uuid) -> Option<String> {
        self.tracker.get(id).map(|edit| EditBuilder::render_preview(&edit))
    }

    /// Materializes a pending edit as scratch files for an external diff
    /// viewer. Returns `None` when no materializer is attached or the id
    /// is unknown.
    pub async fn materialize_diff(&self, id: Uuid) -> Option<ScratchPair> {
        let materializer = self.scratch.as_ref()?;
        let edit = self.tracker.get(id)?;

        match materializer.materialize(&edit).await {
            Ok(pair) => {
                self.tracker.set_scratch(id, Some(pair.clone()));
                Some(pair)
            }
            Err(e) => {
                tracing::warn!("failed to materialize diff: {e}");
                None
            }
        }
    }

    /// Applies a pending edit: the current selection is replaced when one
    /// exists, otherwise the whole document. On success the edit is marked
    /// applied and removed from the pending set in the same operation.
    /// Applying an unknown (already resolved) id is a no-op.
    pub async fn apply_edit(&self, id: Uuid) -> bool {
        let Some(edit) = self.tracker.get(id) else {
            return false;
        };

        let has_selection = self
            .editor
            .selected_text()
            .await
            .is_some_and(|s| !s.is_empty());
        let applied = if has_selection {
            self.editor.replace_selected_text(&edit.modified_code).await
        } else {
            self.editor.replace_document_text(&edit.modified_code).await
        };

        if applied {
            if let Some(resolved) = self.tracker.mark_applied(id) {
                self.cleanup_scratch(&resolved).await;
            }
            self.persist_pending().await;
        }
        applied
    }

    /// Discards a pending edit. Discarding an unknown (already resolved)
    /// id is a no-op; at most one resolution ever succeeds per edit.
    pub async fn discard_edit(&self, id: Uuid) -> bool {
        let edit = self.tracker.get(id);
        let removed = self.tracker.remove(id);
        if removed {
            if let Some(edit) = edit {
                self.cleanup_scratch(&edit).await;
            }
            self.persist_pending().await;
        }
        removed
    }

    /// Applies every pending edit; returns how many succeeded.
    pub async fn apply_all_edits(&self) -> usize {
        let ids: Vec<Uuid> = self.tracker.list().iter().map(|e| e.id).collect();
        let mut applied = 0;
        for id in ids {
            if self.apply_edit(id).await {
                applied += 1;
            }
        }
        applied
    }

    /// Discards every pending edit and deletes the snapshot file.
    pub async fn discard_all_edits(&self) {
        for edit in self.tracker.list() {
            self.cleanup_scratch(&edit).await;
        }
        self.tracker.clear();
        if let Err(e) = self.edit_store.clear().await {
            tracing::warn!("failed to clear pending edit store: {e}");
        }
    }

    async fn cleanup_scratch(&self, edit: &CodeEdit) {
        if let (Some(materializer), Some(pair)) = (self.scratch.as_ref(), edit.scratch.as_ref()) {
            materializer.cleanup(pair).await;
        }
    }

    /// Re-registers persisted, unapplied edits on startup so a restart
    /// does not lose unreviewed proposals. Returns how many were restored.
    pub async fn restore_pending_edits(&self) -> usize {
        let mut restored = 0;
        for edit in self.edit_store.load_all().await {
            if !edit.applied {
                self.tracker.add(edit);
                restored += 1;
            }
        }
        restored
    }

    // ------------------------------------------------------------------
    // Context references
    // ------------------------------------------------------------------

    /// Attaches a file's content as a context reference. Re-adding an
    /// already attached path is a no-op.
    pub async fn add_file_context(&self, path: &Path) -> bool {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("failed to read context file {}: {e}", path.display());
                return false;
            }
        };

        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let reference =
            ContextReference::new(ContextKind::File, label, content).with_file_path(path);

        self.add_reference(reference).await
    }

    /// Attaches the current selection as a context reference.
    pub async fn add_selection_context(&self) -> bool {
        let Some(selection) = self.editor.selected_text().await.filter(|s| !s.is_empty()) else {
            return false;
        };

        let reference = ContextReference::new(ContextKind::Selection, "Selection", selection);
        self.add_reference(reference).await
    }

    /// Attaches a searched code element as a context reference.
    pub async fn add_symbol_context(&self, symbol: &CodeSymbol) -> bool {
        let content = match &symbol.content {
            Some(content) => content.clone(),
            None => match &symbol.file_path {
                Some(path) => match tokio::fs::read_to_string(path).await {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!("failed to read symbol source: {e}");
                        return false;
                    }
                },
                None => return false,
            },
        };

        let kind = match symbol.kind {
            SymbolKind::File => ContextKind::File,
            SymbolKind::Class | SymbolKind::Interface => ContextKind::Class,
            SymbolKind::Method | SymbolKind::Property => ContextKind::Method,
            SymbolKind::Project => ContextKind::Project,
        };

        let mut reference = ContextReference::new(kind, symbol.display_name.clone(), content);
        reference.file_path = symbol.file_path.clone();
        reference.class_name = symbol.class_name.clone();
        reference.method_name = symbol.method_name.clone();
        reference.project_name = symbol.project_name.clone();

        self.add_reference(reference).await
    }

    async fn add_reference(&self, reference: ContextReference) -> bool {
        let mut assembler = self.assembler.lock().await;
        let added = assembler.add_reference(reference);
        if added {
            self.emit_context_changed(&assembler);
        }
        added
    }

    /// Detaches a context reference. Removing a missing id is a no-op.
    pub async fn remove_context(&self, id: Uuid) -> bool {
        let mut assembler = self.assembler.lock().await;
        let removed = assembler.remove_reference(id);
        if removed {
            self.emit_context_changed(&assembler);
        }
        removed
    }

    pub async fn clear_context(&self) {
        let mut assembler = self.assembler.lock().await;
        assembler.clear_references();
        self.emit_context_changed(&assembler);
    }

    pub async fn context_references(&self) -> Vec<ContextReference> {
        self.assembler.lock().await.references().to_vec()
    }

    pub async fn context_summary(&self) -> String {
        self.assembler.lock().await.summary()
    }

    fn emit_context_changed(&self, assembler: &ContextAssembler) {
        let _ = self.events.send(SessionEvent::ContextChanged {
            reference_count: assembler.references().len(),
            token_estimate: assembler.total_token_estimate(),
        });
    }

    // ------------------------------------------------------------------
    // Conversations & models
    // ------------------------------------------------------------------

    /// Snapshot of the active conversation.
    pub async fn conversation(&self) -> Conversation {
        self.conversation.lock().await.clone()
    }

    /// Starts a new conversation: the current one is archived (if it has
    /// any messages), the client transcript is cleared, and a fresh record
    /// takes its place.
    pub async fn new_conversation(&self) {
        let _guard = self.turn_guard.lock().await;

        {
            let conversation = self.conversation.lock().await;
            if !conversation.messages.is_empty() {
                if let Err(e) = self.archive.save(&conversation).await {
                    tracing::warn!("failed to archive conversation: {e}");
                }
            }
        }

        self.inference.clear_history().await;
        let fresh = Conversation::new(self.tracker.mode());
        let id = fresh.id;
        *self.conversation.lock().await = fresh;

        let _ = self.events.send(SessionEvent::ConversationStarted { id });
    }

    /// Archived conversations, most recent first.
    pub async fn conversation_history(&self) -> Vec<Conversation> {
        match self.archive.load_all().await {
            Ok(conversations) => conversations,
            Err(e) => {
                tracing::warn!("failed to load conversation history: {e}");
                Vec::new()
            }
        }
    }

    /// Deletes an archived conversation. Deleting a missing id is a no-op.
    pub async fn delete_conversation(&self, id: Uuid) {
        if let Err(e) = self.archive.delete(id).await {
            tracing::warn!("failed to delete conversation: {e}");
        }
    }

    /// Exports a conversation to a readable transcript document. Unlike
    /// the silent-degrade paths, export failures propagate: it is an
    /// explicit user action expecting feedback.
    pub async fn export_conversation(&self, id: Uuid, destination: &Path) -> anyhow::Result<()> {
        let conversation = self
            .archive
            .load(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Conversation not found: {id}"))?;
        self.archive
            .export_to_markdown(&conversation, destination)
            .await
    }

    /// Refreshes the model catalog. An empty result degrades to a
    /// user-visible diagnostic rather than an error.
    pub async fn refresh_models(&self) -> Vec<String> {
        let models = self.inference.list_models().await;
        if models.is_empty() {
            let _ = self.events.send(SessionEvent::Status {
                text: "No models found. Check that the inference server is running \
                       and reachable, then refresh."
                    .to_string(),
            });
        }
        let _ = self.events.send(SessionEvent::ModelsRefreshed {
            models: models.clone(),
        });
        models
    }

    /// Selects the model for subsequent turns.
    pub async fn select_model(&self, model: &str) {
        self.inference.set_model(model);
        self.conversation.lock().await.model = Some(model.to_string());
    }
}
