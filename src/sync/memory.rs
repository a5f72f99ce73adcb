use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::block::get_block_text_content;
use crate::error::{EditorError, Result};
use crate::sync::types::{DocumentSnapshot, LoadedDocument, Permission};
use crate::sync::DocumentStore;

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, LoadedDocument>,
    saves: Vec<DocumentSnapshot>,
    fail_status: Option<u16>,
    save_delay: Option<Duration>,
}

/// In-process store. Records every save; failures and latency can be injected.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, document_id: &str, doc: LoadedDocument) {
        self.lock().documents.insert(document_id.to_string(), doc);
    }

    /// Every snapshot passed to `save`, oldest first.
    pub fn saves(&self) -> Vec<DocumentSnapshot> {
        self.lock().saves.clone()
    }

    /// Makes loads and saves fail with an API error of `status` until cleared.
    pub fn fail_with(&self, status: Option<u16>) {
        self.lock().fail_status = status;
    }

    pub fn set_save_delay(&self, delay: Option<Duration>) {
        self.lock().save_delay = delay;
    }

    fn injected_failure(&self) -> Result<()> {
        match self.lock().fail_status {
            Some(status) => Err(EditorError::Api {
                status,
                message: "injected failure".into(),
            }),
            None => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn load(&self, document_id: &str) -> Result<LoadedDocument> {
        self.injected_failure()?;
        self.lock()
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| EditorError::NotFound(document_id.to_string()))
    }

    async fn save(&self, snapshot: &DocumentSnapshot) -> Result<()> {
        let delay = self.lock().save_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.injected_failure()?;

        let mut inner = self.lock();
        inner.saves.push(snapshot.clone());
        let permission = inner
            .documents
            .get(&snapshot.document_id)
            .map_or(Permission::default(), |d| d.permission);
        inner.documents.insert(
            snapshot.document_id.clone(),
            LoadedDocument {
                title: snapshot.title.clone(),
                blocks: snapshot.blocks.clone(),
                permission,
            },
        );
        log::debug!(
            "memory store saved {} ({} blocks, first: {:?})",
            snapshot.document_id,
            snapshot.blocks.len(),
            snapshot.blocks.first().map(get_block_text_content)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_helpers::editor_with;

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load("doc").await,
            Err(EditorError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn save_makes_document_loadable() {
        let store = MemoryStore::new();
        let snapshot = editor_with(&["a", "b"]).snapshot();
        store.save(&snapshot).await.unwrap();
        let doc = store.load("doc").await.unwrap();
        assert_eq!(doc.blocks, snapshot.blocks);
        assert_eq!(store.saves().len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_applies_to_load_and_save() {
        let store = MemoryStore::new();
        store.fail_with(Some(503));
        let snapshot = editor_with(&["a"]).snapshot();
        assert!(matches!(
            store.save(&snapshot).await,
            Err(EditorError::Api { status: 503, .. })
        ));
        assert!(store.saves().is_empty());
        store.fail_with(None);
        store.save(&snapshot).await.unwrap();
        assert_eq!(store.saves().len(), 1);
    }
}
