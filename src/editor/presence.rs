//! Collaborator cursors and selections attached to blocks.
//!
//! The editor only stores what the transport reports; who is connected and
//! what colour they get is decided elsewhere.

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorCursor {
    pub user_id: String,
    pub user_name: String,
    pub block_id: BlockId,
    pub offset: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub block_id: BlockId,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorSelection {
    pub user_id: String,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum PresenceEvent {
    Cursor(CollaboratorCursor),
    Selection(CollaboratorSelection),
    Leave { user_id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    cursors: Vec<CollaboratorCursor>,
    selections: Vec<CollaboratorSelection>,
}

impl Presence {
    /// One cursor per user; a newer one replaces the old.
    pub fn set_cursor(&mut self, cursor: CollaboratorCursor) {
        self.cursors.retain(|c| c.user_id != cursor.user_id);
        self.cursors.push(cursor);
    }

    pub fn remove_cursor(&mut self, user_id: &str) {
        self.cursors.retain(|c| c.user_id != user_id);
    }

    pub fn set_selection(&mut self, selection: CollaboratorSelection) {
        self.selections.retain(|s| s.user_id != selection.user_id);
        self.selections.push(selection);
    }

    pub fn remove_selection(&mut self, user_id: &str) {
        self.selections.retain(|s| s.user_id != user_id);
    }

    pub fn apply(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::Cursor(cursor) => self.set_cursor(cursor),
            PresenceEvent::Selection(selection) => self.set_selection(selection),
            PresenceEvent::Leave { user_id } => {
                self.remove_cursor(&user_id);
                self.remove_selection(&user_id);
            }
        }
    }

    pub fn cursors(&self) -> &[CollaboratorCursor] {
        &self.cursors
    }

    pub fn selections(&self) -> &[CollaboratorSelection] {
        &self.selections
    }

    pub fn cursors_in<'a>(&'a self, block_id: &'a str) -> impl Iterator<Item = &'a CollaboratorCursor> {
        self.cursors.iter().filter(move |c| c.block_id == block_id)
    }

    /// Drops entries that point at blocks no longer in `blocks`.
    pub fn prune(&mut self, blocks: &[Block]) {
        let exists = |id: &str| blocks.iter().any(|b| b.id == id);
        self.cursors.retain(|c| exists(&c.block_id));
        self.selections
            .retain(|s| exists(&s.start.block_id) && exists(&s.end.block_id));
    }
}
