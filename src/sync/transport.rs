//! Explicit transport handle for one open document.
//!
//! [`Connection::connect`] returns the editor's end and the peer end of an
//! in-process channel pair. Whatever bridges the real network (a websocket
//! task, a test) drives the peer end.

use tokio::sync::mpsc;

use crate::error::{EditorError, Result};
use crate::sync::types::{Operation, TransportMessage};

#[derive(Debug)]
pub struct Connection {
    document_id: String,
    tx: Option<mpsc::UnboundedSender<TransportMessage>>,
    rx: mpsc::UnboundedReceiver<TransportMessage>,
}

impl Connection {
    pub fn connect(document_id: &str) -> (Connection, Connection) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let local = Connection {
            document_id: document_id.to_string(),
            tx: Some(a_tx),
            rx: b_rx,
        };
        let peer = Connection {
            document_id: document_id.to_string(),
            tx: Some(b_tx),
            rx: a_rx,
        };
        log::debug!("transport connected for {}", document_id);
        (local, peer)
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn is_connected(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn send(&self, message: TransportMessage) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(EditorError::Disconnected)?;
        tx.send(message).map_err(|_| EditorError::Disconnected)
    }

    pub fn send_operation(&self, op: Operation) -> Result<()> {
        self.send(TransportMessage::Operation {
            document_id: self.document_id.clone(),
            op,
        })
    }

    /// Next message for this document. `None` once the other end is gone.
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        while let Some(message) = self.rx.recv().await {
            if self.accepts(&message) {
                return Some(message);
            }
        }
        None
    }

    /// Like [`Connection::recv`] without waiting.
    pub fn try_recv(&mut self) -> Option<TransportMessage> {
        while let Ok(message) = self.rx.try_recv() {
            if self.accepts(&message) {
                return Some(message);
            }
        }
        None
    }

    pub fn disconnect(&mut self) {
        if self.tx.take().is_some() {
            log::debug!("transport disconnected for {}", self.document_id);
        }
        self.rx.close();
    }

    fn accepts(&self, message: &TransportMessage) -> bool {
        let ok = message.document_id() == self.document_id;
        if !ok {
            log::warn!(
                "dropping transport message for {} on connection for {}",
                message.document_id(),
                self.document_id
            );
        }
        ok
    }
}
