use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::block::utils::{default_content, set_content_text};
use crate::block::{create_block, Block, BlockType};
use crate::sync::types::{LoadedDocument, Permission};
use crate::sync::{DocumentSession, MemoryStore};

use super::AppState;

/// Lists get one item per line of `text`.
pub fn block(id: &str, ty: BlockType, text: &str, parent: Option<&str>) -> Block {
    let mut content = default_content(ty);
    set_content_text(&mut content, text);
    Block {
        id: id.into(),
        content,
        ..create_block(ty, parent.map(String::from))
    }
}

/// Text blocks `b0`, `b1`, ... in an editable document.
pub async fn test_state(texts: &[&str]) -> AppState {
    let blocks = texts
        .iter()
        .enumerate()
        .map(|(i, text)| block(&format!("b{}", i), BlockType::Text, text, None))
        .collect();
    test_state_from(blocks, Permission::Edit).await
}

pub async fn test_state_from(blocks: Vec<Block>, permission: Permission) -> AppState {
    let store = MemoryStore::new();
    store.insert(
        "doc",
        LoadedDocument {
            title: "Notes".into(),
            blocks,
            permission,
        },
    );
    let session =
        DocumentSession::open(Arc::new(store), "doc", None, Duration::from_millis(1000)).await;
    AppState::new(session)
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

pub fn alt(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::ALT)
}

pub fn shift(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::SHIFT)
}
