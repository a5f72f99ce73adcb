mod input;
mod state;
pub use state::*;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use crate::block::utils::generate_id;
use crate::config::{AppConfig, StoreBackend};
use crate::error::Result;
use crate::sync::{DocumentClient, DocumentSession, FileStore, SyncStatus};

use input::handle_key;

/// Cursor colour announced to collaborators.
const CURSOR_COLOR: &str = "#4fc1ff";

pub async fn run(
    config: &AppConfig,
    document_id: &str,
    terminal: &mut DefaultTerminal,
) -> Result<SyncStatus> {
    let session = open_session(config, document_id).await;
    let mut state = AppState::new(session);
    state.theme = config.ui.theme;
    let user_id = generate_id();

    let (tx, mut rx) = mpsc::unbounded_channel::<AppMessage>();

    // Spawn event reader task
    let event_tx = tx.clone();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        loop {
            match reader.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if event_tx.send(AppMessage::Key(key)).is_err() {
                        break;
                    }
                }
                Some(Err(_)) => break,
                None => break,
                _ => {}
            }
        }
    });

    // Spawn tick timer
    let tick_tx = tx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if tick_tx.send(AppMessage::Tick).is_err() {
                break;
            }
        }
    });

    // Main loop
    loop {
        terminal.draw(|frame| crate::ui::render(frame, &state))?;

        let Some(msg) = rx.recv().await else {
            break;
        };
        match msg {
            AppMessage::Key(key) => {
                handle_key(&mut state, &key);
                state.announce_cursor(&user_id, &config.editor.user_name, CURSOR_COLOR);
            }
            AppMessage::Tick => handle_tick(&mut state),
        }
        if state.should_quit {
            break;
        }
    }

    let status = state.session.close().await;
    log::info!("closed {} with status {:?}", document_id, status);
    Ok(status)
}

async fn open_session(config: &AppConfig, document_id: &str) -> DocumentSession {
    let debounce = config.editor.save_debounce();
    let mut session = match config.store.backend {
        StoreBackend::File => {
            let store = FileStore::new(config.documents_dir());
            log::info!("opening {} from {}", document_id, store.dir().display());
            DocumentSession::open(Arc::new(store), document_id, None, debounce).await
        }
        StoreBackend::Http => {
            let store = DocumentClient::new(&config.store.url, &config.store.token);
            log::info!("opening {} from {}", document_id, config.store.url);
            DocumentSession::open(Arc::new(store), document_id, None, debounce).await
        }
    };
    session.set_max_versions(config.editor.max_versions);
    session
}

/// Applies collaborator messages and surfaces finished saves.
pub(crate) fn handle_tick(state: &mut AppState) {
    if state.session.poll_inbound() > 0 {
        state.sync_buffer();
    }
    if let Some(notice) = state.session.drain_save_outcomes() {
        state.error_popup = Some(notice);
    }
    if let Some(notice) = state.session.take_transport_notice() {
        state.error_popup.get_or_insert(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::test_state;
    use super::*;
    use crate::sync::MemoryStore;

    #[tokio::test(start_paused = true)]
    async fn tick_marks_document_saved() {
        let mut state = test_state(&["draft"]).await;
        state.edit_text(|b| b.insert_char('!'));
        assert_eq!(state.session.status(), &SyncStatus::Pending);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle_tick(&mut state);
        assert_eq!(state.session.status(), &SyncStatus::Saved);
        assert!(state.error_popup.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_opens_error_popup() {
        let store = MemoryStore::new();
        store.fail_with(Some(503));
        let session =
            DocumentSession::open(Arc::new(store), "doc", None, Duration::from_millis(1000))
                .await;
        let state = AppState::new(session);
        let popup = state.error_popup.as_ref().unwrap();
        assert_eq!(popup.title, "Server Error");
        assert_eq!(state.editor().blocks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_document_starts_new() {
        let session = DocumentSession::open(
            Arc::new(MemoryStore::new()),
            "fresh",
            None,
            Duration::from_millis(1000),
        )
        .await;
        let state = AppState::new(session);
        assert!(state.error_popup.is_none());
        assert_eq!(state.status_message.as_deref(), Some("New document"));
    }
}
