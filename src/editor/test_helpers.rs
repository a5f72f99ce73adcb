use chrono::{TimeZone, Utc};

use crate::block::utils::content_with_text;
use crate::block::{get_block_text_content, Block, BlockType};
use crate::sync::types::{LoadedDocument, Permission};

use super::EditorState;

pub fn make_block(id: &str, ty: BlockType, text: &str) -> Block {
    let at = Utc.with_ymd_and_hms(2026, 2, 21, 9, 0, 0).unwrap();
    Block {
        id: id.into(),
        created_at: at,
        updated_at: at,
        parent_id: None,
        content: content_with_text(ty, text),
    }
}

pub fn text_block(id: &str, text: &str) -> Block {
    make_block(id, BlockType::Text, text)
}

/// Document "doc" with text blocks `b0`, `b1`, ... holding `texts`.
pub fn editor_with(texts: &[&str]) -> EditorState {
    let blocks = texts
        .iter()
        .enumerate()
        .map(|(i, text)| text_block(&format!("b{}", i), text))
        .collect();
    editor_from(blocks)
}

pub fn editor_from(blocks: Vec<Block>) -> EditorState {
    EditorState::open(
        "doc",
        LoadedDocument {
            title: "Test document".into(),
            blocks,
            permission: Permission::Edit,
        },
    )
}

pub fn ids(editor: &EditorState) -> Vec<String> {
    editor.blocks().iter().map(|b| b.id.clone()).collect()
}

pub fn text_of(editor: &EditorState, id: &str) -> String {
    editor
        .block(id)
        .map(get_block_text_content)
        .unwrap_or_default()
}
