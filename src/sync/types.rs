use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::block::{Block, BlockContent, BlockId, RichText};
use crate::editor::presence::PresenceEvent;

/// A shallow set of block fields to overwrite, in wire (camelCase) form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockPatch(pub Map<String, Value>);

impl BlockPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the span payload field (`content`, or `summary` for toggles).
    pub fn spans(field: &str, spans: &[RichText]) -> Self {
        Self::new().field(field, serde_json::to_value(spans).unwrap_or(Value::Null))
    }

    pub fn parent(parent_id: Option<&str>) -> Self {
        let value = parent_id.map_or(Value::Null, |p| Value::String(p.to_string()));
        Self::new().field("parentId", value)
    }

    /// The full variant payload, `type` tag included.
    pub fn content(content: &BlockContent) -> Self {
        match serde_json::to_value(content) {
            Ok(Value::Object(map)) => Self(map),
            _ => Self::new(),
        }
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    /// Builds a patch from a JSON object; anything else yields `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertPayload {
    pub block: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<BlockId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePayload {
    pub direction: MoveDirection,
}

/// One block-level mutation, as broadcast to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Operation {
    Update { block_id: BlockId, payload: BlockPatch },
    Insert { block_id: BlockId, payload: InsertPayload },
    Delete { block_id: BlockId },
    Move { block_id: BlockId, payload: MovePayload },
}

impl Operation {
    pub fn block_id(&self) -> &str {
        match self {
            Self::Update { block_id, .. }
            | Self::Insert { block_id, .. }
            | Self::Delete { block_id }
            | Self::Move { block_id, .. } => block_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOperation {
    pub document_id: String,
    pub op: Operation,
}

/// Everything a transport connection carries for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum TransportMessage {
    Operation { document_id: String, op: Operation },
    Presence { document_id: String, event: PresenceEvent },
}

impl TransportMessage {
    pub fn document_id(&self) -> &str {
        match self {
            Self::Operation { document_id, .. } | Self::Presence { document_id, .. } => document_id,
        }
    }
}

impl From<RemoteOperation> for TransportMessage {
    fn from(remote: RemoteOperation) -> Self {
        Self::Operation {
            document_id: remote.document_id,
            op: remote.op,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    Comment,
    #[default]
    Edit,
    Full,
}

impl Permission {
    pub fn can_edit(&self) -> bool {
        matches!(self, Self::Edit | Self::Full)
    }
}

/// What the persistence collaborator hands back on load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub title: String,
    pub blocks: Vec<Block>,
    pub permission: Permission,
}

/// Fetched document body. Blocks stay raw so one bad block cannot fail the load.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Value>,
    #[serde(default)]
    pub permission: Permission,
}

impl From<RawDocument> for LoadedDocument {
    fn from(raw: RawDocument) -> Self {
        Self {
            title: raw.title,
            blocks: crate::block::parse_blocks_lenient(&raw.blocks),
            permission: raw.permission,
        }
    }
}

/// Save payload: the whole document at one revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub document_id: String,
    pub title: String,
    pub blocks: Vec<Block>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub revision: u64,
}
