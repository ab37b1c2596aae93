//! Change notification fan-out for the document and event tables.
//!
//! Every repository mutation publishes a `TableChange` through a single
//! `ChangeNotifier`. Subscribers (the WebSocket layer, tests) receive the
//! notice and re-query whatever slice of the store they care about, so the
//! fetch-and-subscribe logic lives in one place instead of per consumer.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Buffered notices per subscriber before lagging ones are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// Table a change notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Documents,
    Events,
}

/// Kind of mutation that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A single table-level change notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableChange {
    pub table: Table,
    pub kind: ChangeKind,
    /// Document the change belongs to, when known. Event inserts carry the
    /// parent document id so subscribers can scope their refresh.
    pub document_id: Option<Uuid>,
}

/// Broadcast hub for store change notices.
///
/// Cloning is cheap; all clones share the same channel. Publishing never
/// blocks and succeeds even with zero subscribers.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<TableChange>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.tx.subscribe()
    }

    /// Publish a change notice. A send error only means no subscribers are
    /// listening, which is not a failure.
    pub fn publish(&self, table: Table, kind: ChangeKind, document_id: Option<Uuid>) {
        let notice = TableChange {
            table,
            kind,
            document_id,
        };
        if self.tx.send(notice).is_err() {
            tracing::trace!(?table, ?kind, "Change notice dropped (no subscribers)");
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
