//! Orchestrator tests against mock collaborators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use sidekick_core::chat::Conversation;
use sidekick_core::edit::CodeEdit;
use sidekick_core::editor::EditorAccess;
use sidekick_core::inference::InferenceService;
use sidekick_core::mode::{InteractionMode, ModeTracker};
use sidekick_core::repository::{ConversationRepository, EditStore};

use crate::events::{SessionEvent, SessionEventReceiver, session_event_channel};
use crate::session::ChatSession;

// ----------------------------------------------------------------------
// Mock collaborators
// ----------------------------------------------------------------------

#[derive(Default)]
struct RecordedCall {
    prompt: String,
    system: Option<String>,
    context: Option<String>,
}

struct MockInference {
    replies: StdMutex<Vec<String>>,
    calls: StdMutex<Vec<RecordedCall>>,
    cleared: AtomicBool,
}

impl MockInference {
    fn with_replies(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: StdMutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            calls: StdMutex::new(Vec::new()),
            cleared: AtomicBool::new(false),
        })
    }

    fn next_reply(&self) -> String {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| "OK".to_string())
    }

    fn record(&self, prompt: &str, system: Option<&str>, context: Option<&str>) {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            system: system.map(Into::into),
            context: context.map(Into::into),
        });
    }

    fn last_call<T>(&self, f: impl FnOnce(&RecordedCall) -> T) -> T {
        let calls = self.calls.lock().unwrap();
        f(calls.last().expect("no inference call recorded"))
    }
}

#[async_trait]
impl InferenceService for MockInference {
    async fn list_models(&self) -> Vec<String> {
        Vec::new()
    }

    async fn send_turn(
        &self,
        user_message: &str,
        system_prompt: Option<&str>,
        context: Option<&str>,
    ) -> String {
        self.record(user_message, system_prompt, context);
        self.next_reply()
    }

    async fn stream_turn(
        &self,
        user_message: &str,
        chunk_tx: mpsc::UnboundedSender<String>,
        system_prompt: Option<&str>,
        context: Option<&str>,
    ) -> String {
        self.record(user_message, system_prompt, context);
        let reply = self.next_reply();
        // Deliver in two chunks to exercise incremental consumption.
        let split = reply.len() / 2;
        let (head, tail) = reply.split_at(split);
        if !head.is_empty() {
            let _ = chunk_tx.send(head.to_string());
        }
        if !tail.is_empty() {
            let _ = chunk_tx.send(tail.to_string());
        }
        reply
    }

    async fn clear_history(&self) {
        self.cleared.store(true, Ordering::SeqCst);
    }

    fn model(&self) -> String {
        "test-model".to_string()
    }

    fn set_model(&self, _model: &str) {}
}

#[derive(Default)]
struct MockEditor {
    document: StdMutex<Option<String>>,
    selection: StdMutex<Option<String>>,
    path: StdMutex<Option<PathBuf>>,
    language: StdMutex<Option<String>>,
    replaced_selection: StdMutex<Vec<String>>,
    replaced_document: StdMutex<Vec<String>>,
}

impl MockEditor {
    fn with_document(document: &str) -> Arc<Self> {
        let editor = Self::default();
        *editor.document.lock().unwrap() = Some(document.to_string());
        Arc::new(editor)
    }

    fn set_selection(&self, selection: Option<&str>) {
        *self.selection.lock().unwrap() = selection.map(Into::into);
    }
}

#[async_trait]
impl EditorAccess for MockEditor {
    async fn active_document_text(&self) -> Option<String> {
        self.document.lock().unwrap().clone()
    }

    async fn selected_text(&self) -> Option<String> {
        self.selection.lock().unwrap().clone()
    }

    async fn active_document_path(&self) -> Option<PathBuf> {
        self.path.lock().unwrap().clone()
    }

    async fn active_document_language(&self) -> Option<String> {
        self.language.lock().unwrap().clone()
    }

    async fn replace_selected_text(&self, text: &str) -> bool {
        self.replaced_selection.lock().unwrap().push(text.to_string());
        true
    }

    async fn replace_document_text(&self, text: &str) -> bool {
        self.replaced_document.lock().unwrap().push(text.to_string());
        true
    }
}

#[derive(Default)]
struct MemoryEditStore {
    edits: StdMutex<Vec<CodeEdit>>,
}

#[async_trait]
impl EditStore for MemoryEditStore {
    async fn save_all(&self, edits: &[CodeEdit]) -> Result<()> {
        *self.edits.lock().unwrap() = edits.to_vec();
        Ok(())
    }

    async fn load_all(&self) -> Vec<CodeEdit> {
        self.edits.lock().unwrap().clone()
    }

    async fn upsert(&self, edit: &CodeEdit) -> Result<()> {
        let mut edits = self.edits.lock().unwrap();
        edits.retain(|e| e.id != edit.id);
        edits.push(edit.clone());
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        self.edits.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.edits.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Default)]
struct MemoryArchive {
    conversations: StdMutex<HashMap<Uuid, Conversation>>,
}

#[async_trait]
impl ConversationRepository for MemoryArchive {
    async fn save(&self, conversation: &Conversation) -> Result<()> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Conversation>> {
        let mut all: Vec<_> = self.conversations.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(all)
    }

    async fn load(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.conversations.lock().unwrap().get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.conversations.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn export_to_markdown(
        &self,
        conversation: &Conversation,
        destination: &Path,
    ) -> Result<()> {
        std::fs::write(destination, format!("# {}\n", conversation.title))?;
        Ok(())
    }
}

struct Harness {
    session: ChatSession,
    inference: Arc<MockInference>,
    editor: Arc<MockEditor>,
    store: Arc<MemoryEditStore>,
    archive: Arc<MemoryArchive>,
    events: SessionEventReceiver,
}

impl Harness {
    fn new(replies: &[&str]) -> Self {
        let inference = MockInference::with_replies(replies);
        let editor = MockEditor::with_document("int x=0;");
        let store = Arc::new(MemoryEditStore::default());
        let archive = Arc::new(MemoryArchive::default());
        let (events_tx, events_rx) = session_event_channel();

        let session = ChatSession::new(
            inference.clone(),
            editor.clone(),
            Arc::new(ModeTracker::new()),
            store.clone(),
            archive.clone(),
            events_tx,
        );

        Self {
            session,
            inference,
            editor,
            store,
            archive,
            events: events_rx,
        }
    }

    fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

const AGENT_REPLY: &str = "Here:\n```csharp\nint x=1;\n```\nDone";

// ----------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------

#[tokio::test]
async fn test_hello_turn_produces_two_messages() {
    let mut harness = Harness::new(&["Hello back!"]);

    harness.session.send_message("hello").await;

    let conversation = harness.session.conversation().await;
    assert_eq!(conversation.messages.len(), 2);
    assert!(conversation.messages[0].is_user);
    assert!(!conversation.messages[1].is_user);
    assert!(!conversation.messages[1].has_code_blocks);
    assert_eq!(
        conversation.messages[1].model_name.as_deref(),
        Some("test-model")
    );

    let events = harness.drain_events();
    assert!(matches!(events[0], SessionEvent::MessageAppended { .. }));
    assert!(events.iter().any(|e| matches!(e, SessionEvent::StreamStarted)));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::StreamChunk { .. }))
    );
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::TurnCompleted { .. }))
    );
}

#[tokio::test]
async fn test_empty_input_is_a_noop() {
    let mut harness = Harness::new(&[]);

    harness.session.send_message("   \n  ").await;

    assert!(harness.session.conversation().await.messages.is_empty());
    assert!(harness.drain_events().is_empty());
    assert!(harness.inference.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_stream_chunks_arrive_in_order() {
    let mut harness = Harness::new(&["Hello back!"]);

    harness.session.send_message("hi").await;

    let chunks: Vec<String> = harness
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::StreamChunk { content } => Some(content),
            _ => None,
        })
        .collect();
    assert_eq!(chunks.concat(), "Hello back!");
    assert!(chunks.len() >= 2);
}

#[tokio::test]
async fn test_agent_mode_registers_pending_edit() {
    let mut harness = Harness::new(&[AGENT_REPLY]);
    harness.session.set_mode(InteractionMode::Agent).await;
    harness.editor.set_selection(Some("int x=0;"));

    harness.session.send_message("set x to 1").await;

    let pending = harness.session.pending_edits();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].modified_code, "int x=1;");
    assert_eq!(pending[0].original_code, "int x=0;");
    assert_eq!(pending[0].description, "Here:");
    assert!(!pending[0].applied);

    // The assistant message links to the proposal.
    let conversation = harness.session.conversation().await;
    assert_eq!(conversation.messages[1].edit_id, Some(pending[0].id));

    // Registration triggered persistence.
    assert_eq!(harness.store.load_all().await.len(), 1);

    let events = harness.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::PendingEditsChanged { count: 1 }
    )));
}

#[tokio::test]
async fn test_ask_mode_never_registers_edits() {
    let harness = Harness::new(&[AGENT_REPLY]);

    harness.session.send_message("set x to 1").await;

    assert!(harness.session.pending_edits().is_empty());
    assert!(harness.store.load_all().await.is_empty());
    // The response still parses as a code-bearing message for display.
    let conversation = harness.session.conversation().await;
    assert!(conversation.messages[1].has_code_blocks);
}

#[tokio::test]
async fn test_noop_change_is_not_registered() {
    let harness = Harness::new(&["Same:\n```csharp\nint x=0;\n```"]);
    harness.session.set_mode(InteractionMode::Agent).await;
    harness.editor.set_selection(Some("int x=0;"));

    harness.session.send_message("do nothing").await;

    assert!(harness.session.pending_edits().is_empty());
}

#[tokio::test]
async fn test_apply_replaces_selection_when_present() {
    let harness = Harness::new(&[AGENT_REPLY]);
    harness.session.set_mode(InteractionMode::Agent).await;
    harness.editor.set_selection(Some("int x=0;"));
    harness.session.send_message("set x to 1").await;

    let id = harness.session.pending_edits()[0].id;
    assert!(harness.session.apply_edit(id).await);

    assert_eq!(
        harness.editor.replaced_selection.lock().unwrap().as_slice(),
        &["int x=1;".to_string()]
    );
    assert!(harness.editor.replaced_document.lock().unwrap().is_empty());
    // Applied edits leave the pending set and the store.
    assert!(harness.session.pending_edits().is_empty());
    assert!(harness.store.load_all().await.is_empty());
}

#[tokio::test]
async fn test_apply_replaces_document_without_selection() {
    let harness = Harness::new(&[AGENT_REPLY]);
    harness.session.set_mode(InteractionMode::Agent).await;
    harness.editor.set_selection(Some("int x=0;"));
    harness.session.send_message("set x to 1").await;

    harness.editor.set_selection(None);
    let id = harness.session.pending_edits()[0].id;
    assert!(harness.session.apply_edit(id).await);

    assert_eq!(
        harness.editor.replaced_document.lock().unwrap().as_slice(),
        &["int x=1;".to_string()]
    );
}

#[tokio::test]
async fn test_discard_then_apply_is_idempotent() {
    let harness = Harness::new(&[AGENT_REPLY]);
    harness.session.set_mode(InteractionMode::Agent).await;
    harness.editor.set_selection(Some("int x=0;"));
    harness.session.send_message("set x to 1").await;

    let id = harness.session.pending_edits()[0].id;
    assert!(harness.session.discard_edit(id).await);
    // Second resolution attempts are no-ops.
    assert!(!harness.session.apply_edit(id).await);
    assert!(!harness.session.discard_edit(id).await);
    assert!(harness.editor.replaced_selection.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_apply_all_and_discard_all() {
    let harness = Harness::new(&[AGENT_REPLY, "Next:\n```csharp\nint y=2;\n```"]);
    harness.session.set_mode(InteractionMode::Agent).await;
    harness.editor.set_selection(Some("int x=0;"));

    harness.session.send_message("set x to 1").await;
    harness.session.send_message("set y to 2").await;
    assert_eq!(harness.session.pending_edits().len(), 2);

    assert_eq!(harness.session.apply_all_edits().await, 2);
    assert!(harness.session.pending_edits().is_empty());

    harness.session.discard_all_edits().await;
    assert!(harness.store.load_all().await.is_empty());
}

#[tokio::test]
async fn test_restore_skips_applied_edits() {
    let harness = Harness::new(&[]);

    let unapplied = CodeEdit::new(None, "a", "b", "restore me");
    let mut applied = CodeEdit::new(None, "c", "d", "already done");
    applied.applied = true;
    harness
        .store
        .save_all(&[unapplied.clone(), applied])
        .await
        .unwrap();

    assert_eq!(harness.session.restore_pending_edits().await, 1);
    let pending = harness.session.pending_edits();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, unapplied.id);
}

#[tokio::test]
async fn test_context_references_precede_live_snapshot() {
    let harness = Harness::new(&["noted"]);

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("helper.rs");
    std::fs::write(&file, "pub fn helper() {}").unwrap();
    assert!(harness.session.add_file_context(&file).await);

    harness.session.send_message("what is helper?").await;

    harness.inference.last_call(|call| {
        let context = call.context.as_deref().expect("context missing");
        let reference = context.find("pub fn helper() {}").unwrap();
        let snapshot = context.find("int x=0;").unwrap();
        assert!(reference < snapshot);
        assert!(call.system.is_some());
    });
}

#[tokio::test]
async fn test_duplicate_file_context_is_noop() {
    let harness = Harness::new(&[]);

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("dup.rs");
    std::fs::write(&file, "x").unwrap();

    assert!(harness.session.add_file_context(&file).await);
    assert!(!harness.session.add_file_context(&file).await);
    assert_eq!(harness.session.context_references().await.len(), 1);
}

#[tokio::test]
async fn test_mode_switch_keeps_pending_edits_and_updates_conversation() {
    let harness = Harness::new(&[AGENT_REPLY]);
    harness.session.set_mode(InteractionMode::Agent).await;
    harness.editor.set_selection(Some("int x=0;"));
    harness.session.send_message("set x to 1").await;

    harness.session.set_mode(InteractionMode::Ask).await;

    assert_eq!(harness.session.pending_edits().len(), 1);
    assert_eq!(harness.session.conversation().await.mode, InteractionMode::Ask);
}

#[tokio::test]
async fn test_system_prompt_follows_mode() {
    let harness = Harness::new(&["one", "two"]);

    harness.session.send_message("ask mode question").await;
    harness.inference.last_call(|call| {
        assert!(call.system.as_deref().unwrap().contains("WITHOUT modifying"));
    });

    harness.session.set_mode(InteractionMode::Agent).await;
    harness.session.send_message("agent mode request").await;
    harness.inference.last_call(|call| {
        assert!(call.system.as_deref().unwrap().contains("NEVER use ellipsis"));
    });
}

#[tokio::test]
async fn test_turns_archive_write_through() {
    let harness = Harness::new(&["first", "second"]);

    harness.session.send_message("one").await;
    let id = harness.session.conversation().await.id;
    let archived = harness.archive.load(id).await.unwrap().unwrap();
    assert_eq!(archived.messages.len(), 2);

    harness.session.send_message("two").await;
    let archived = harness.archive.load(id).await.unwrap().unwrap();
    assert_eq!(archived.messages.len(), 4);
}

#[tokio::test]
async fn test_new_conversation_archives_and_clears() {
    let mut harness = Harness::new(&["reply"]);

    harness.session.send_message("hello").await;
    let old_id = harness.session.conversation().await.id;

    harness.session.new_conversation().await;

    let fresh = harness.session.conversation().await;
    assert_ne!(fresh.id, old_id);
    assert!(fresh.messages.is_empty());
    assert!(harness.inference.cleared.load(Ordering::SeqCst));
    assert!(harness.archive.load(old_id).await.unwrap().is_some());
    assert!(
        harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::ConversationStarted { .. }))
    );
}

#[tokio::test]
async fn test_delete_conversation_is_idempotent() {
    let harness = Harness::new(&["reply"]);
    harness.session.send_message("hello").await;
    let id = harness.session.conversation().await.id;

    harness.session.delete_conversation(id).await;
    assert!(harness.archive.load(id).await.unwrap().is_none());
    // Deleting again must not fail.
    harness.session.delete_conversation(id).await;
}

#[tokio::test]
async fn test_export_conversation() {
    let harness = Harness::new(&["reply"]);
    harness.session.send_message("hello").await;
    let id = harness.session.conversation().await.id;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.md");
    harness
        .session
        .export_conversation(id, &destination)
        .await
        .unwrap();
    assert!(destination.exists());

    // Exporting an unknown conversation is an error the user sees.
    assert!(
        harness
            .session
            .export_conversation(Uuid::new_v4(), &destination)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_explain_selection_requires_selection() {
    let mut harness = Harness::new(&["explanation"]);

    harness.session.explain_selection().await;
    assert!(harness.inference.calls.lock().unwrap().is_empty());
    assert!(
        harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::Status { .. }))
    );

    harness.editor.set_selection(Some("fn a() {}"));
    harness.session.explain_selection().await;
    harness.inference.last_call(|call| {
        assert!(call.prompt.contains("Please explain the following code"));
        assert!(call.prompt.contains("fn a() {}"));
    });
}

#[tokio::test]
async fn test_template_runs_with_custom_system_prompt() {
    let harness = Harness::new(&["tests generated"]);
    harness.editor.set_selection(Some("fn a() {}"));

    assert!(harness.session.run_template("unittest").await);

    harness.inference.last_call(|call| {
        assert!(call.prompt.contains("Generate unit tests"));
        assert!(call.system.as_deref().unwrap().contains("unit tests"));
    });
}

#[tokio::test]
async fn test_template_without_required_selection_does_not_run() {
    let harness = Harness::new(&[]);

    assert!(!harness.session.run_template("unittest").await);
    assert!(harness.inference.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_models_emits_diagnostic_when_empty() {
    let mut harness = Harness::new(&[]);

    let models = harness.session.refresh_models().await;
    assert!(models.is_empty());

    let events = harness.drain_events();
    assert!(events.iter().any(|e| matches!(e, SessionEvent::Status { .. })));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::ModelsRefreshed { .. }))
    );
}
