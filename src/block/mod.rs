pub mod tree;
pub mod types;
pub mod utils;

pub use types::{Alignment, Block, BlockContent, BlockId, BlockType, ListItem, RichText, TableCell, TextFormat};
pub use utils::{
    block_type_name, convert_block_type, create_block, find_block_by_id, find_block_index_by_id,
    get_block_text_content, is_block_empty, Conversion, ConversionLoss,
};

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decodes one block from fetched JSON, never failing.
///
/// A block that does not match its variant schema becomes a text block that
/// keeps the id, parent, timestamps and whatever text could be found.
pub fn parse_block_lenient(val: &Value) -> Block {
    match serde_json::from_value::<Block>(val.clone()) {
        Ok(block) => block,
        Err(e) => {
            let id = val
                .get("id")
                .and_then(|v| v.as_str())
                .map(String::from)
                .unwrap_or_else(utils::generate_id);
            log::warn!("block {} does not match its schema ({}), keeping as text", id, e);
            salvage_block(val, id)
        }
    }
}

pub fn parse_blocks_lenient(values: &[Value]) -> Vec<Block> {
    values.iter().map(parse_block_lenient).collect()
}

fn salvage_block(val: &Value, id: BlockId) -> Block {
    let timestamp = |key: &str| {
        val.get(key)
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    };
    let now = Utc::now();
    let created_at = timestamp("createdAt").unwrap_or(now);
    let updated_at = timestamp("updatedAt").unwrap_or(created_at);
    let parent_id = val
        .get("parentId")
        .and_then(|v| v.as_str())
        .map(String::from);

    Block {
        id,
        created_at,
        updated_at,
        parent_id,
        content: utils::content_with_text(BlockType::Text, &salvage_text(val)),
    }
}

fn salvage_text(val: &Value) -> String {
    fn spans(v: &Value) -> Option<String> {
        let arr = v.as_array()?;
        Some(
            arr.iter()
                .filter_map(|s| s.get("text").and_then(|t| t.as_str()))
                .collect(),
        )
    }

    if let Some(s) = val.get("content").and_then(|v| v.as_str()) {
        return s.to_string();
    }
    if let Some(text) = val.get("content").and_then(spans) {
        return text;
    }
    if let Some(text) = val.get("summary").and_then(spans) {
        return text;
    }
    if let Some(items) = val.get("items").and_then(|v| v.as_array()) {
        return items
            .iter()
            .filter_map(|item| item.get("content").and_then(spans))
            .collect::<Vec<_>>()
            .join("\n");
    }
    String::new()
}
