pub mod block;
pub mod editor;
pub mod error;
pub mod slash;
pub mod sync;

// Convenience re-exports
pub use block::{Block, BlockContent, BlockId, BlockType};
pub use editor::{Caret, EditorState};
pub use error::{EditorError, ErrorContext, ErrorNotice, Result};
pub use sync::{DocumentSession, DocumentStore, SyncStatus};
