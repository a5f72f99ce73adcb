use crate::block::{get_block_text_content, tree, Block, BlockContent};
use crate::config::Theme;
use crate::edit_buffer::EditBuffer;
use crate::editor::presence::{CollaboratorCursor, PresenceEvent};
use crate::editor::{Caret, EditorState};
use crate::error::{EditorError, ErrorContext, ErrorNotice};
use crate::slash::SlashMenuState;
use crate::sync::DocumentSession;

#[derive(Debug, Clone, PartialEq)]
pub enum AppMessage {
    Key(crossterm::event::KeyEvent),
    Tick,
}

/// A block as the document view shows it.
#[derive(Debug, Clone, Copy)]
pub struct VisibleBlock<'a> {
    pub block: &'a Block,
    pub depth: usize,
}

pub struct AppState {
    pub session: DocumentSession,
    pub buffer: EditBuffer,
    pub slash: Option<SlashMenuState>,
    pub error_popup: Option<ErrorNotice>,
    pub status_message: Option<String>,
    pub hints: Vec<(String, &'static str)>,
    pub should_quit: bool,
    pub theme: Theme,
    pub(super) announced: Option<(String, usize)>,
}

impl AppState {
    pub fn new(session: DocumentSession) -> Self {
        let mut state = Self {
            session,
            buffer: EditBuffer::default(),
            slash: None,
            error_popup: None,
            status_message: None,
            hints: default_hints(),
            should_quit: false,
            theme: Theme::default(),
            announced: None,
        };
        match state.session.load_error() {
            Some(EditorError::NotFound(_)) => {
                state.status_message = Some("New document".into());
            }
            Some(err) => {
                state.error_popup = Some(ErrorNotice::new(ErrorContext::Load, err));
            }
            None => {}
        }
        if !state.editor().can_edit() {
            state.status_message = Some("Read-only".into());
        }
        state.buffer = EditBuffer::new(&state.focused_text());
        state
    }

    pub fn editor(&self) -> &EditorState {
        self.session.editor()
    }

    pub fn focused_id(&self) -> Option<String> {
        self.editor().focused_block_id().map(str::to_string)
    }

    pub fn focused_block(&self) -> Option<&Block> {
        let editor = self.editor();
        editor.focused_block_id().and_then(|id| editor.block(id))
    }

    fn focused_text(&self) -> String {
        self.focused_block()
            .map(get_block_text_content)
            .unwrap_or_default()
    }

    /// Moves focus and puts the cursor where the caret says.
    pub fn focus(&mut self, caret: &Caret) {
        self.session.edit(|e| e.focus_block(&caret.block_id));
        self.buffer = EditBuffer::at(&self.focused_text(), caret.offset);
    }

    /// Focus on `id` with the cursor at the end of its text.
    pub fn focus_end(&mut self, id: &str) {
        self.session.edit(|e| e.focus_block(id));
        self.buffer = EditBuffer::new(&self.focused_text());
    }

    /// Runs a text change on the buffer and writes it to the focused block.
    /// A refused write restores the old cursor.
    pub fn edit_text(&mut self, change: impl FnOnce(&mut EditBuffer)) -> bool {
        let Some(id) = self.focused_id() else {
            return false;
        };
        let before = self.buffer.cursor;
        change(&mut self.buffer);
        let text = self.buffer.text();
        let written = self.session.edit(|e| e.set_block_text(&id, &text));
        if !written {
            self.buffer.cursor = before;
        }
        let current = self.focused_text();
        self.buffer.reload(&current);
        written
    }

    /// Resyncs the buffer after remote changes.
    pub fn sync_buffer(&mut self) {
        let current = self.focused_text();
        if current != self.buffer.text() {
            self.buffer.reload(&current);
        }
    }

    /// Blocks in document order, skipping the contents of closed toggles.
    pub fn visible_blocks(&self) -> Vec<VisibleBlock<'_>> {
        let blocks = self.editor().blocks();
        let mut hidden: Vec<String> = Vec::new();
        let mut visible = Vec::new();
        for block in blocks {
            let ancestors = tree::ancestors(blocks, &block.id).unwrap_or_default();
            if ancestors.iter().any(|a| hidden.contains(a)) {
                continue;
            }
            if matches!(block.content, BlockContent::Toggle { is_open: false, .. }) {
                hidden.push(block.id.clone());
            }
            visible.push(VisibleBlock {
                block,
                depth: ancestors.len(),
            });
        }
        visible
    }

    /// Sends the local cursor to collaborators when it moved.
    pub fn announce_cursor(&mut self, user_id: &str, user_name: &str, color: &str) {
        let Some(block_id) = self.focused_id() else {
            return;
        };
        let here = (block_id, self.buffer.cursor);
        if self.announced.as_ref() == Some(&here) {
            return;
        }
        self.session.send_presence(PresenceEvent::Cursor(CollaboratorCursor {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            block_id: here.0.clone(),
            offset: here.1,
            color: color.to_string(),
        }));
        self.announced = Some(here);
    }

    /// Index of the list item the cursor is on, for list blocks.
    pub fn cursor_item(&self) -> usize {
        self.buffer.line_index()
    }
}

fn default_hints() -> Vec<(String, &'static str)> {
    vec![
        ("/".into(), "commands"),
        ("Tab".into(), "indent"),
        ("Alt+↑↓".into(), "move"),
        ("C-t".into(), "toggle"),
        ("C-q".into(), "quit"),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::super::test_helpers::{block, test_state, test_state_from};
    use super::*;
    use crate::block::BlockType;
    use crate::sync::types::{BlockPatch, LoadedDocument, Operation, Permission, TransportMessage};
    use crate::sync::{Connection, MemoryStore};
    use serde_json::json;

    async fn connected_state() -> (AppState, Connection) {
        let store = MemoryStore::new();
        store.insert(
            "doc",
            LoadedDocument {
                title: "Shared".into(),
                blocks: vec![block("b0", BlockType::Text, "shared", None)],
                permission: Permission::Edit,
            },
        );
        let (local, peer) = Connection::connect("doc");
        let session = DocumentSession::open(
            Arc::new(store),
            "doc",
            Some(local),
            Duration::from_millis(1000),
        )
        .await;
        (AppState::new(session), peer)
    }

    #[tokio::test(start_paused = true)]
    async fn new_state_focuses_first_block() {
        let state = test_state(&["alpha", "beta"]).await;
        assert_eq!(state.focused_id().as_deref(), Some("b0"));
        assert_eq!(state.buffer.text(), "alpha");
        assert_eq!(state.buffer.cursor, 5);
        assert!(state.error_popup.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn edit_text_writes_through() {
        let mut state = test_state(&["helo"]).await;
        state.buffer.cursor = 3;
        assert!(state.edit_text(|b| b.insert_char('l')));
        assert_eq!(state.buffer.text(), "hello");
        assert_eq!(state.buffer.cursor, 4);
        assert!(state.editor().is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_edit_restores_buffer() {
        let mut state = test_state_from(
            vec![block("b0", BlockType::Text, "locked", None)],
            Permission::View,
        )
        .await;
        assert_eq!(state.status_message.as_deref(), Some("Read-only"));
        assert!(!state.edit_text(|b| b.insert_char('!')));
        assert_eq!(state.buffer.text(), "locked");
        assert_eq!(state.buffer.cursor, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_toggle_hides_descendants() {
        let mut toggle = block("t", BlockType::Toggle, "more", None);
        if let crate::block::BlockContent::Toggle { is_open, .. } = &mut toggle.content {
            *is_open = false;
        }
        let state = test_state_from(
            vec![
                toggle,
                block("c", BlockType::Text, "inside", Some("t")),
                block("g", BlockType::Text, "deeper", Some("c")),
                block("after", BlockType::Text, "after", None),
            ],
            Permission::Edit,
        )
        .await;

        let ids: Vec<&str> = state
            .visible_blocks()
            .iter()
            .map(|v| v.block.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t", "after"]);
    }

    #[tokio::test(start_paused = true)]
    async fn depth_follows_parents() {
        let state = test_state_from(
            vec![
                block("a", BlockType::Text, "a", None),
                block("b", BlockType::BulletedList, "b", Some("a")),
            ],
            Permission::Edit,
        )
        .await;
        let depths: Vec<usize> = state.visible_blocks().iter().map(|v| v.depth).collect();
        assert_eq!(depths, vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn cursor_item_counts_lines() {
        let mut state = test_state_from(
            vec![block("l", BlockType::Checklist, "one\ntwo\nthree", None)],
            Permission::Edit,
        )
        .await;
        state.buffer.cursor = 5;
        assert_eq!(state.cursor_item(), 1);
        state.buffer.cursor = 0;
        assert_eq!(state.cursor_item(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cursor_is_announced_once_per_move() {
        let (mut state, mut peer) = connected_state().await;
        state.announce_cursor("u1", "Ada", "#fff");
        state.announce_cursor("u1", "Ada", "#fff");

        let Some(TransportMessage::Presence { event, .. }) = peer.try_recv() else {
            panic!("Expected presence message");
        };
        assert!(matches!(event, PresenceEvent::Cursor(c) if c.block_id == "b0" && c.offset == 6));
        assert!(peer.try_recv().is_none());

        state.buffer.move_line_start();
        state.announce_cursor("u1", "Ada", "#fff");
        assert!(peer.try_recv().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_edit_refreshes_buffer_on_tick() {
        let (mut state, peer) = connected_state().await;
        let patch = BlockPatch::from_json(json!({"content": [{"text": "changed"}]})).unwrap();
        peer.send_operation(Operation::Update {
            block_id: "b0".into(),
            payload: patch,
        })
        .unwrap();

        super::super::handle_tick(&mut state);
        assert_eq!(state.buffer.text(), "changed");
    }
}
