pub mod history;
pub mod ops;
pub mod presence;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use history::{DocumentVersion, VersionHistory};
pub use ops::Caret;

use std::collections::HashSet;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::block::utils::set_content_text;
use crate::block::{
    create_block, find_block_by_id, find_block_index_by_id, tree, Block, BlockContent, BlockId,
    BlockType,
};
use crate::sync::types::{
    BlockPatch, DocumentSnapshot, InsertPayload, LoadedDocument, MoveDirection, MovePayload,
    Operation, Permission, RemoteOperation,
};
use presence::{Presence, PresenceEvent};

/// Fields a patch may never overwrite.
const PROTECTED_FIELDS: [&str; 2] = ["id", "createdAt"];
/// Fields kept when a patch switches the block to another variant.
const BASE_FIELDS: [&str; 4] = ["id", "createdAt", "updatedAt", "parentId"];

/// Owns one open document: the ordered block list, the selection and the
/// pending outbound operations.
///
/// Every command is total. Unknown ids, boundary moves and read-only
/// permission turn a command into a no-op that returns `false`/`None`.
#[derive(Debug, Clone)]
pub struct EditorState {
    document_id: String,
    title: String,
    blocks: Vec<Block>,
    current: Option<BlockId>,
    focused: Option<BlockId>,
    revision: u64,
    saved_revision: u64,
    outbox: Vec<Operation>,
    permission: Permission,
    presence: Presence,
}

impl EditorState {
    /// A fresh document holding one empty text block.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self::open(
            document_id,
            LoadedDocument {
                title: String::new(),
                blocks: Vec::new(),
                permission: Permission::default(),
            },
        )
    }

    /// Seeds the store from a fetched document, repairing corrupted structure.
    pub fn open(document_id: impl Into<String>, doc: LoadedDocument) -> Self {
        let blocks = repair_blocks(doc.blocks);
        let first = blocks.first().map(|b| b.id.clone());
        Self {
            document_id: document_id.into(),
            title: doc.title,
            blocks,
            current: first.clone(),
            focused: first,
            revision: 0,
            saved_revision: 0,
            outbox: Vec::new(),
            permission: doc.permission,
            presence: Presence::default(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        find_block_by_id(&self.blocks, id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        find_block_index_by_id(&self.blocks, id)
    }

    pub fn current_block_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn focused_block_id(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.revision > self.saved_revision
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
    }

    pub fn can_edit(&self) -> bool {
        self.permission.can_edit()
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn apply_presence(&mut self, event: PresenceEvent) {
        self.presence.apply(event);
        self.presence.prune(&self.blocks);
    }

    // ---- selection ----

    /// Selects `id` (or nothing). Focus is dropped unless it is on `id`.
    pub fn set_current_block(&mut self, id: Option<&str>) {
        match id {
            None => {
                self.current = None;
                self.focused = None;
            }
            Some(id) => {
                if self.block(id).is_none() {
                    return;
                }
                if self.focused.as_deref() != Some(id) {
                    self.focused = None;
                }
                self.current = Some(id.to_string());
            }
        }
    }

    /// Makes `id` both current and focused.
    pub fn focus_block(&mut self, id: &str) {
        if self.block(id).is_none() {
            return;
        }
        self.current = Some(id.to_string());
        self.focused = Some(id.to_string());
    }

    // ---- block commands ----

    /// Inserts a new `ty` block right after `after` (or at the end when
    /// `after` is missing or unknown), then focuses it.
    pub fn add_block(&mut self, ty: BlockType, after: Option<&str>) -> Option<BlockId> {
        let parent = after
            .and_then(|id| self.block(id))
            .and_then(|b| b.parent_id.clone());
        self.insert_block(create_block(ty, parent), after)
    }

    /// Inserts a prepared block after `after` and focuses it.
    pub fn insert_block(&mut self, block: Block, after: Option<&str>) -> Option<BlockId> {
        let id = block.id.clone();
        let op = Operation::Insert {
            block_id: id.clone(),
            payload: InsertPayload {
                block,
                after: after.map(String::from),
            },
        };
        if !self.commit(op) {
            return None;
        }
        self.focus_block(&id);
        Some(id)
    }

    /// Shallow-merges `patch` into the block and refreshes `updatedAt`.
    /// Unknown ids and patches that would break the block are no-ops.
    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> bool {
        self.commit(Operation::Update {
            block_id: id.to_string(),
            payload: patch,
        })
    }

    /// Removes the block, lifting its children to its own parent. The last
    /// remaining block is never deleted.
    pub fn delete_block(&mut self, id: &str) -> bool {
        self.commit(Operation::Delete {
            block_id: id.to_string(),
        })
    }

    pub fn move_block_up(&mut self, id: &str) -> bool {
        self.move_block(id, MoveDirection::Up)
    }

    pub fn move_block_down(&mut self, id: &str) -> bool {
        self.move_block(id, MoveDirection::Down)
    }

    fn move_block(&mut self, id: &str, direction: MoveDirection) -> bool {
        self.commit(Operation::Move {
            block_id: id.to_string(),
            payload: MovePayload { direction },
        })
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        if !self.can_edit() || self.title == title {
            return false;
        }
        self.title = title.to_string();
        self.revision += 1;
        true
    }

    /// Replaces the text of whatever payload field the variant edits,
    /// keeping its other fields.
    pub fn set_block_text(&mut self, id: &str, text: &str) -> bool {
        let Some(block) = self.block(id) else {
            return false;
        };
        let mut content = block.content.clone();
        if !set_content_text(&mut content, text) || content == block.content {
            return false;
        }
        self.update_block(id, BlockPatch::content(&content))
    }

    /// Flips the `checked` flag of one checklist item.
    pub fn toggle_checked(&mut self, id: &str, item_index: usize) -> bool {
        let Some(BlockContent::Checklist { items }) = self.block(id).map(|b| &b.content) else {
            return false;
        };
        let mut items = items.clone();
        let Some(item) = items.get_mut(item_index) else {
            return false;
        };
        item.checked = Some(!item.checked.unwrap_or(false));
        match serde_json::to_value(&items) {
            Ok(value) => self.update_block(id, BlockPatch::new().field("items", value)),
            Err(_) => false,
        }
    }

    pub fn toggle_open(&mut self, id: &str) -> bool {
        let Some(BlockContent::Toggle { is_open, .. }) = self.block(id).map(|b| &b.content) else {
            return false;
        };
        let open = !*is_open;
        self.update_block(id, BlockPatch::new().field("isOpen", Value::Bool(open)))
    }

    // ---- persistence and transport boundary ----

    /// Records that everything up to `revision` is durable.
    pub fn mark_saved(&mut self, revision: u64) {
        self.saved_revision = self.saved_revision.max(revision);
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            document_id: self.document_id.clone(),
            title: self.title.clone(),
            blocks: self.blocks.clone(),
            updated_at: Utc::now(),
            revision: self.revision,
        }
    }

    /// Drains the operations performed by local commands since the last call.
    pub fn take_outbound(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.outbox)
    }

    /// Applies an operation from another collaborator. It is not echoed to
    /// the outbox and does not make the document dirty.
    pub fn apply_remote(&mut self, remote: &RemoteOperation) -> bool {
        if remote.document_id != self.document_id {
            log::warn!(
                "dropping remote op for document {} (open: {})",
                remote.document_id,
                self.document_id
            );
            return false;
        }
        let applied = self.apply(&remote.op);
        if !applied {
            log::debug!("remote {:?} on {} was a no-op", op_kind(&remote.op), remote.op.block_id());
        }
        applied
    }

    fn commit(&mut self, op: Operation) -> bool {
        if !self.can_edit() {
            log::debug!("read-only document, ignoring {:?}", op_kind(&op));
            return false;
        }
        if !self.apply(&op) {
            return false;
        }
        log::debug!("applied {:?} on {}", op_kind(&op), op.block_id());
        self.revision += 1;
        self.outbox.push(op);
        true
    }

    fn apply(&mut self, op: &Operation) -> bool {
        let applied = match op {
            Operation::Update { block_id, payload } => self.apply_update(block_id, payload),
            Operation::Insert { payload, .. } => {
                self.apply_insert(payload.block.clone(), payload.after.as_deref())
            }
            Operation::Delete { block_id } => self.apply_delete(block_id),
            Operation::Move { block_id, payload } => self.apply_move(block_id, payload.direction),
        };
        if applied {
            self.presence.prune(&self.blocks);
        }
        applied
    }

    fn apply_update(&mut self, id: &str, patch: &BlockPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        if let Some(parent) = patch.get("parentId") {
            match parent {
                Value::Null => {}
                Value::String(parent) => {
                    if self.block(parent).is_none()
                        || tree::would_create_cycle(&self.blocks, id, parent)
                    {
                        log::warn!("rejecting parent {} for block {}", parent, id);
                        return false;
                    }
                }
                other => {
                    log::warn!("rejecting non-string parentId {} for block {}", other, id);
                    return false;
                }
            }
        }

        let existing = &self.blocks[index];
        let mut fields: Map<String, Value> = match serde_json::to_value(existing) {
            Ok(Value::Object(map)) => map,
            _ => return false,
        };
        let switches_variant = patch
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|tag| tag != existing.block_type().as_str());
        if switches_variant {
            fields.retain(|key, _| BASE_FIELDS.contains(&key.as_str()));
        }
        for (key, value) in &patch.0 {
            if !PROTECTED_FIELDS.contains(&key.as_str()) {
                fields.insert(key.clone(), value.clone());
            }
        }

        match serde_json::from_value::<Block>(Value::Object(fields)) {
            Ok(mut block) => {
                block.touch();
                self.blocks[index] = block;
                true
            }
            Err(e) => {
                log::warn!("ignoring patch for block {}: {}", id, e);
                false
            }
        }
    }

    fn apply_insert(&mut self, mut block: Block, after: Option<&str>) -> bool {
        if self.block(&block.id).is_some() {
            log::warn!("ignoring insert of duplicate block id {}", block.id);
            return false;
        }
        if let Some(parent) = block.parent_id.as_deref() {
            if self.block(parent).is_none() {
                log::warn!("inserted block {} has unknown parent {}, making it root", block.id, parent);
                block.parent_id = None;
            }
        }
        let position = after
            .and_then(|id| self.index_of(id))
            .map_or(self.blocks.len(), |i| i + 1);
        self.blocks.insert(position, block);
        true
    }

    fn apply_delete(&mut self, id: &str) -> bool {
        if self.blocks.len() <= 1 {
            return false;
        }
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let removed = self.blocks.remove(index);

        for block in self.blocks.iter_mut() {
            if block.parent_id.as_deref() == Some(id) {
                block.parent_id = removed.parent_id.clone();
                block.touch();
            }
        }

        if self.current.as_deref() == Some(id) {
            let was_focused = self.focused.as_deref() == Some(id);
            let next = self.blocks[index.saturating_sub(1)].id.clone();
            self.current = Some(next.clone());
            self.focused = was_focused.then_some(next);
        }
        true
    }

    fn apply_move(&mut self, id: &str, direction: MoveDirection) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.blocks.len() => index + 1,
            _ => return false,
        };
        self.blocks.swap(index, target);
        self.blocks[target].touch();
        true
    }
}

fn op_kind(op: &Operation) -> &'static str {
    match op {
        Operation::Update { .. } => "update",
        Operation::Insert { .. } => "insert",
        Operation::Delete { .. } => "delete",
        Operation::Move { .. } => "move",
    }
}

/// Drops duplicate ids, resets dangling or cyclic parents and guarantees at
/// least one block.
fn repair_blocks(blocks: Vec<Block>) -> Vec<Block> {
    let mut seen: HashSet<BlockId> = HashSet::new();
    let mut blocks: Vec<Block> = blocks
        .into_iter()
        .filter(|b| {
            let fresh = seen.insert(b.id.clone());
            if !fresh {
                log::warn!("dropping block with duplicate id {}", b.id);
            }
            fresh
        })
        .collect();

    for block in blocks.iter_mut() {
        if let Some(parent) = block.parent_id.as_deref() {
            if !seen.contains(parent) {
                log::warn!("block {} points at missing parent {}, making it root", block.id, parent);
                block.parent_id = None;
            }
        }
    }

    for i in 0..blocks.len() {
        if tree::ancestors(&blocks, &blocks[i].id).is_err() {
            log::warn!("breaking parent cycle at block {}", blocks[i].id);
            blocks[i].parent_id = None;
        }
    }

    if blocks.is_empty() {
        blocks.push(create_block(BlockType::Text, None));
    }
    blocks
}
