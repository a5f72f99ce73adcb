//! Debounced persistence.
//!
//! Every `schedule` replaces the pending snapshot and restarts the quiet
//! window. Only the latest snapshot after the window is saved, and saves run
//! one at a time on a single task, so an older revision is never written
//! after a newer one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::sync::types::DocumentSnapshot;
use crate::sync::DocumentStore;

#[derive(Debug)]
pub struct SaveOutcome {
    pub snapshot: DocumentSnapshot,
    pub result: Result<()>,
}

impl SaveOutcome {
    pub fn revision(&self) -> u64 {
        self.snapshot.revision
    }
}

pub struct SaveScheduler {
    tx: watch::Sender<Option<DocumentSnapshot>>,
    handle: JoinHandle<()>,
}

impl SaveScheduler {
    pub fn spawn<S: DocumentStore>(
        store: Arc<S>,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SaveOutcome>) {
        let (tx, rx) = watch::channel(None);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(store, rx, debounce, outcome_tx));
        (Self { tx, handle }, outcome_rx)
    }

    pub fn schedule(&self, snapshot: DocumentSnapshot) {
        self.tx.send_replace(Some(snapshot));
    }

    /// Saves whatever is still pending, then stops the task.
    pub async fn shutdown(self) {
        let Self { tx, handle } = self;
        drop(tx);
        if let Err(e) = handle.await {
            log::error!("save task ended abnormally: {}", e);
        }
    }
}

async fn run<S: DocumentStore>(
    store: Arc<S>,
    mut rx: watch::Receiver<Option<DocumentSnapshot>>,
    debounce: Duration,
    outcomes: mpsc::UnboundedSender<SaveOutcome>,
) {
    let mut last_attempted: Option<u64> = None;

    'outer: loop {
        if rx.changed().await.is_err() {
            break;
        }
        // quiet window, restarted by every newer snapshot
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                }
                _ = tokio::time::sleep(debounce) => break,
            }
        }
        let latest = rx.borrow_and_update().clone();
        save_latest(&*store, latest, &mut last_attempted, &outcomes).await;
    }

    let pending = rx.borrow().clone();
    save_latest(&*store, pending, &mut last_attempted, &outcomes).await;
}

async fn save_latest<S: DocumentStore>(
    store: &S,
    snapshot: Option<DocumentSnapshot>,
    last_attempted: &mut Option<u64>,
    outcomes: &mpsc::UnboundedSender<SaveOutcome>,
) {
    let Some(snapshot) = snapshot else {
        return;
    };
    if last_attempted.is_some_and(|last| snapshot.revision <= last) {
        log::debug!(
            "skipping save of revision {}, already at {:?}",
            snapshot.revision,
            last_attempted
        );
        return;
    }
    *last_attempted = Some(snapshot.revision);

    let result = store.save(&snapshot).await;
    match &result {
        Ok(()) => log::debug!("saved {} revision {}", snapshot.document_id, snapshot.revision),
        Err(e) => log::warn!(
            "save of {} revision {} failed: {}",
            snapshot.document_id,
            snapshot.revision,
            e
        ),
    }
    let _ = outcomes.send(SaveOutcome { snapshot, result });
}
