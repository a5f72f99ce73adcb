use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::editor::history::VersionHistory;
use crate::editor::presence::PresenceEvent;
use crate::editor::EditorState;
use crate::error::{EditorError, ErrorContext, ErrorNotice};
use crate::sync::debounce::{SaveOutcome, SaveScheduler};
use crate::sync::transport::Connection;
use crate::sync::types::{RemoteOperation, TransportMessage};
use crate::sync::DocumentStore;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    Saved,
    Pending,
    Failed(ErrorNotice),
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Saved => "Saved",
            Self::Pending => "Saving...",
            Self::Failed(_) => "Save failed",
        }
    }
}

/// One open document wired to its store and, optionally, a transport.
///
/// Local commands go through [`DocumentSession::edit`] so their operations
/// reach collaborators and a save gets scheduled.
pub struct DocumentSession {
    editor: EditorState,
    scheduler: SaveScheduler,
    outcomes: mpsc::UnboundedReceiver<SaveOutcome>,
    connection: Option<Connection>,
    status: SyncStatus,
    history: VersionHistory,
    last_scheduled: u64,
    load_error: Option<EditorError>,
    transport_notice: Option<ErrorNotice>,
}

impl DocumentSession {
    /// Loads `document_id`. A failed load still opens the document with a
    /// single empty block; the error is kept for [`DocumentSession::load_error`].
    pub async fn open<S: DocumentStore>(
        store: Arc<S>,
        document_id: &str,
        connection: Option<Connection>,
        debounce: Duration,
    ) -> Self {
        let (editor, load_error) = match store.load(document_id).await {
            Ok(doc) => (EditorState::open(document_id, doc), None),
            Err(e) => {
                log::warn!("failed to load {}: {}", document_id, e);
                (EditorState::new(document_id), Some(e))
            }
        };
        let mut history = VersionHistory::new();
        if load_error.is_none() {
            history.add_version(editor.snapshot());
        }
        let last_scheduled = editor.revision();
        let (scheduler, outcomes) = SaveScheduler::spawn(store, debounce);
        Self {
            editor,
            scheduler,
            outcomes,
            connection,
            status: SyncStatus::Saved,
            history,
            last_scheduled,
            load_error,
            transport_notice: None,
        }
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Versions recorded at load and after every successful save.
    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    pub fn set_max_versions(&mut self, max: usize) {
        self.history.set_max_versions(max);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Puts the document back to a recorded version. The restore is an
    /// ordinary edit: collaborators see it and it gets saved.
    pub fn restore_version(&mut self, version_id: &str) -> bool {
        let Some(version) = self.history.get(version_id).cloned() else {
            log::warn!("no version {} for {}", version_id, self.editor.document_id());
            return false;
        };
        let restored = self.edit(|e| e.restore_blocks(&version.title, &version.blocks));
        if restored {
            log::info!(
                "restored {} to version {}",
                self.editor.document_id(),
                version.number
            );
            self.history.mark_current(version_id);
        }
        restored
    }

    pub fn load_error(&self) -> Option<&EditorError> {
        self.load_error.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_connected)
    }

    /// Runs a local command, broadcasts what it did and schedules a save.
    pub fn edit<T>(&mut self, command: impl FnOnce(&mut EditorState) -> T) -> T {
        let result = command(&mut self.editor);
        self.flush_outbound();
        if self.editor.revision() > self.last_scheduled {
            self.last_scheduled = self.editor.revision();
            self.scheduler.schedule(self.editor.snapshot());
            self.status = SyncStatus::Pending;
        }
        result
    }

    /// Tells collaborators where the local user is.
    pub fn send_presence(&mut self, event: PresenceEvent) {
        let message = TransportMessage::Presence {
            document_id: self.editor.document_id().to_string(),
            event,
        };
        let sent = self.connection.as_ref().map(|conn| conn.send(message));
        if let Some(Err(e)) = sent {
            self.lose_connection(&e);
        }
    }

    /// Applies one message from a collaborator. Returns whether it changed
    /// anything.
    pub fn handle_inbound(&mut self, message: TransportMessage) -> bool {
        match message {
            TransportMessage::Operation { document_id, op } => self
                .editor
                .apply_remote(&RemoteOperation { document_id, op }),
            TransportMessage::Presence { document_id, event } => {
                if document_id != self.editor.document_id() {
                    log::warn!("dropping presence for document {}", document_id);
                    return false;
                }
                self.editor.apply_presence(event);
                true
            }
        }
    }

    /// Applies every message already waiting on the connection.
    pub fn poll_inbound(&mut self) -> usize {
        let mut messages = Vec::new();
        let mut lost = false;
        if let Some(conn) = self.connection.as_mut() {
            while let Some(message) = conn.try_recv() {
                messages.push(message);
            }
            lost = !conn.is_connected();
        }
        let applied = messages
            .into_iter()
            .map(|message| self.handle_inbound(message))
            .filter(|applied| *applied)
            .count();
        if lost {
            self.lose_connection(&EditorError::Disconnected);
        }
        applied
    }

    /// Folds finished saves into the status. Returns the notice of the last
    /// failure, if any save failed.
    pub fn drain_save_outcomes(&mut self) -> Option<ErrorNotice> {
        let mut notice = None;
        while let Ok(outcome) = self.outcomes.try_recv() {
            if let Some(n) = record_outcome(
                &mut self.editor,
                &mut self.status,
                &mut self.history,
                outcome,
            ) {
                notice = Some(n);
            }
        }
        notice
    }

    /// Waits for the next save to finish and records it. Returns the saved
    /// revision, or `None` once the save task is gone.
    pub async fn next_save(&mut self) -> Option<u64> {
        let outcome = self.outcomes.recv().await?;
        let revision = outcome.revision();
        record_outcome(&mut self.editor, &mut self.status, &mut self.history, outcome);
        Some(revision)
    }

    /// Set once when the transport goes away.
    pub fn take_transport_notice(&mut self) -> Option<ErrorNotice> {
        self.transport_notice.take()
    }

    /// Flushes the pending save, disconnects and returns the final status.
    pub async fn close(self) -> SyncStatus {
        let Self {
            mut editor,
            scheduler,
            mut outcomes,
            connection,
            mut status,
            mut history,
            ..
        } = self;

        if let Some(mut conn) = connection {
            conn.disconnect();
        }
        scheduler.shutdown().await;
        while let Some(outcome) = outcomes.recv().await {
            record_outcome(&mut editor, &mut status, &mut history, outcome);
        }
        if editor.is_dirty() && status == SyncStatus::Saved {
            status = SyncStatus::Pending;
        }
        log::debug!("closed {} ({})", editor.document_id(), status.label());
        status
    }

    fn flush_outbound(&mut self) {
        let ops = self.editor.take_outbound();
        let Some(conn) = self.connection.as_ref() else {
            return;
        };
        let failed = ops.into_iter().find_map(|op| conn.send_operation(op).err());
        if let Some(e) = failed {
            self.lose_connection(&e);
        }
    }

    fn lose_connection(&mut self, err: &EditorError) {
        log::warn!(
            "transport for {} lost: {}",
            self.editor.document_id(),
            err
        );
        if let Some(mut conn) = self.connection.take() {
            conn.disconnect();
        }
        self.transport_notice = Some(ErrorNotice::new(ErrorContext::Transport, err));
    }
}

fn record_outcome(
    editor: &mut EditorState,
    status: &mut SyncStatus,
    history: &mut VersionHistory,
    outcome: SaveOutcome,
) -> Option<ErrorNotice> {
    match outcome.result {
        Ok(()) => {
            editor.mark_saved(outcome.snapshot.revision);
            history.add_version(outcome.snapshot);
            if !editor.is_dirty() {
                *status = SyncStatus::Saved;
            }
            None
        }
        Err(e) => {
            let notice = ErrorNotice::new(ErrorContext::Save, &e);
            *status = SyncStatus::Failed(notice.clone());
            Some(notice)
        }
    }
}
