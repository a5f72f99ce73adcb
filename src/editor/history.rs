//! Saved versions of a document.
//!
//! A version is taken each time a save goes through. The history is bounded:
//! once it holds `max_versions` entries the oldest is dropped first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::block::utils::generate_id;
use crate::block::{Block, BlockId};
use crate::sync::types::{BlockPatch, DocumentSnapshot};

use super::EditorState;

pub const DEFAULT_MAX_VERSIONS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentVersion {
    pub id: String,
    /// Counts up from 1 for the lifetime of the history, gaps included.
    pub number: u64,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
pub struct VersionHistory {
    versions: VecDeque<DocumentVersion>,
    max_versions: usize,
    next_number: u64,
    current: Option<usize>,
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::with_max(DEFAULT_MAX_VERSIONS)
    }
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history keeping at most `max` versions (at least one).
    pub fn with_max(max: usize) -> Self {
        Self {
            versions: VecDeque::new(),
            max_versions: max.max(1),
            next_number: 1,
            current: None,
        }
    }

    /// Records `snapshot` as the newest version and makes it current.
    pub fn add_version(&mut self, snapshot: DocumentSnapshot) -> &DocumentVersion {
        while self.versions.len() >= self.max_versions {
            if let Some(dropped) = self.versions.pop_front() {
                log::debug!("dropping version {} of {}", dropped.number, snapshot.document_id);
            }
        }
        let version = DocumentVersion {
            id: generate_id(),
            number: self.next_number,
            revision: snapshot.revision,
            created_at: snapshot.updated_at,
            title: snapshot.title,
            blocks: snapshot.blocks,
        };
        self.next_number += 1;
        self.versions.push_back(version);
        self.current = Some(self.versions.len() - 1);
        &self.versions[self.versions.len() - 1]
    }

    /// Oldest first.
    pub fn versions(&self) -> impl Iterator<Item = &DocumentVersion> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    pub fn get(&self, id: &str) -> Option<&DocumentVersion> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn latest(&self) -> Option<&DocumentVersion> {
        self.versions.back()
    }

    /// The version the document was last saved as or restored to.
    pub fn current(&self) -> Option<&DocumentVersion> {
        self.current.and_then(|i| self.versions.get(i))
    }

    pub fn mark_current(&mut self, id: &str) -> bool {
        match self.versions.iter().position(|v| v.id == id) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }

    /// Changes the cap, dropping the oldest versions that no longer fit.
    pub fn set_max_versions(&mut self, max: usize) {
        self.max_versions = max.max(1);
        if self.versions.len() > self.max_versions {
            let excess = self.versions.len() - self.max_versions;
            self.versions.drain(..excess);
            self.current = Some(self.versions.len() - 1);
        }
    }

    pub fn clear(&mut self) {
        self.versions.clear();
        self.current = None;
    }
}

impl EditorState {
    /// Brings the document back to `title` and `blocks` using ordinary block
    /// commands, so every step lands in the outbox. Returns whether anything
    /// changed.
    pub fn restore_blocks(&mut self, title: &str, blocks: &[Block]) -> bool {
        if !self.can_edit() || blocks.is_empty() {
            return false;
        }
        let before = self.revision;
        let focused = self.focused.clone();

        // insert at root first; parents are set once every block exists
        let mut previous: Option<BlockId> = None;
        for block in blocks {
            if self.block(&block.id).is_none() {
                let mut fresh = block.clone();
                fresh.parent_id = None;
                self.insert_block(fresh, previous.as_deref());
            }
            previous = Some(block.id.clone());
        }

        let extra: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|b| !blocks.iter().any(|t| t.id == b.id))
            .map(|b| b.id.clone())
            .collect();
        for id in &extra {
            self.delete_block(id);
        }

        for (target, block) in blocks.iter().enumerate() {
            while self.index_of(&block.id).is_some_and(|i| i > target) {
                if !self.move_block_up(&block.id) {
                    break;
                }
            }
        }

        // detach first so re-parenting never passes through a cycle
        for block in blocks {
            let wanted = self.restorable_parent(block);
            let current = self.block(&block.id).and_then(|b| b.parent_id.clone());
            if current.is_some() && current != wanted {
                self.update_block(&block.id, BlockPatch::parent(None));
            }
        }

        for block in blocks {
            let wanted = self.restorable_parent(block);
            let Some(current) = self.block(&block.id) else {
                continue;
            };
            let content_differs = current.content != block.content;
            let parent_differs = current.parent_id != wanted;
            if !content_differs && !parent_differs {
                continue;
            }
            let mut patch = BlockPatch::new();
            if content_differs {
                patch = restore_patch(current, block);
            }
            if parent_differs {
                patch = patch.field("parentId", wanted.map_or(Value::Null, Value::String));
            }
            self.update_block(&block.id, patch);
        }

        self.set_title(title);

        let refocus = focused
            .filter(|id| self.block(id).is_some())
            .or_else(|| self.blocks.first().map(|b| b.id.clone()));
        if let Some(id) = refocus {
            self.focus_block(&id);
        }

        self.revision > before
    }

    fn restorable_parent(&self, block: &Block) -> Option<BlockId> {
        block
            .parent_id
            .clone()
            .filter(|parent| self.block(parent).is_some())
    }
}

/// Content patch turning `current` into `target`. Fields the target leaves
/// out are cleared explicitly, since a patch only overwrites what it names.
fn restore_patch(current: &Block, target: &Block) -> BlockPatch {
    let mut patch = BlockPatch::content(&target.content);
    if current.block_type() != target.block_type() {
        return patch;
    }
    if let Ok(Value::Object(fields)) = serde_json::to_value(&current.content) {
        for (key, value) in fields {
            if patch.get(&key).is_none() {
                let cleared = if value.is_array() {
                    Value::Array(Vec::new())
                } else {
                    Value::Null
                };
                patch = patch.field(&key, cleared);
            }
        }
    }
    patch
}
