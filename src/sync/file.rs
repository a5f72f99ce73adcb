use std::path::{Path, PathBuf};

use crate::error::{EditorError, Result};
use crate::sync::types::{DocumentSnapshot, LoadedDocument, RawDocument};
use crate::sync::DocumentStore;

/// One JSON file per document under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, document_id: &str) -> Result<PathBuf> {
        let valid = !document_id.is_empty()
            && !document_id.starts_with('.')
            && !document_id.contains(['/', '\\']);
        if !valid {
            return Err(EditorError::Config(format!(
                "invalid document id {:?}",
                document_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", document_id)))
    }
}

impl DocumentStore for FileStore {
    async fn load(&self, document_id: &str) -> Result<LoadedDocument> {
        let path = self.path_for(document_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EditorError::NotFound(document_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let raw: RawDocument = serde_json::from_str(&content)?;
        Ok(raw.into())
    }

    /// Writes to a temp file next to the target, then renames over it.
    async fn save(&self, snapshot: &DocumentSnapshot) -> Result<()> {
        let path = self.path_for(&snapshot.document_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(snapshot)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::debug!(
            "saved {} at revision {} to {}",
            snapshot.document_id,
            snapshot.revision,
            path.display()
        );
        Ok(())
    }
}
