pub mod client;
pub mod debounce;
pub mod file;
pub mod memory;
pub mod session;
pub mod transport;
pub mod types;

pub use client::DocumentClient;
pub use debounce::{SaveOutcome, SaveScheduler};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::{DocumentSession, SyncStatus};
pub use transport::Connection;

use std::future::Future;

use crate::error::Result;
use types::{DocumentSnapshot, LoadedDocument};

/// The persistence collaborator: fetches a document and stores snapshots.
///
/// Implementations decide retries; callers see each failure once.
pub trait DocumentStore: Send + Sync + 'static {
    fn load(&self, document_id: &str) -> impl Future<Output = Result<LoadedDocument>> + Send;

    fn save(&self, snapshot: &DocumentSnapshot) -> impl Future<Output = Result<()>> + Send;
}
