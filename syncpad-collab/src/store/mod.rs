//! Document store contract and backends.
//!
//! The store is an external collaborator: a record store keyed by document
//! id with point reads, partial updates, and a push-based change feed
//! scoped to one document.
//!
//! ```text
//! ┌────────────┐  fetch / update   ┌───────────────┐
//! │ SyncEngine │ ────────────────► │ DocumentStore │
//! │ (per doc)  │                   │ (REST/memory) │
//! └─────┬──────┘                   └───────┬───────┘
//!       ▲                                  │ committed rows
//!       │          ChangeFeed              ▼
//!       └───────────◄──────────── subscribe(doc_id)
//! ```
//!
//! Delivery on the feed is at-least-once and in commit order; consumers
//! dedup their own writes via the engine's echo filter.
//!
//! Reference: Kleppmann — Designing Data-Intensive Applications, Chapter 5

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use syncpad_core::{Document, DocumentChange, DocumentId, DocumentPatch};

pub use memory::{MemoryStore, StoreStats};
pub use rest::RestStore;

/// Store errors. Write failures are transient and non-fatal: local editor
/// state is never rolled back over one.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error("store read failed: {0}")]
    ReadFailed(String),
    #[error("store write failed: {0}")]
    WriteFailed(String),
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),
}

/// Push stream of committed-row snapshots for one document.
///
/// Dropping the feed detaches it: the backing pump task (if any) is
/// aborted so no stale callback outlives the subscription.
#[derive(Debug)]
pub struct ChangeFeed {
    rx: mpsc::Receiver<DocumentChange>,
    pump: Option<JoinHandle<()>>,
}

impl ChangeFeed {
    pub fn new(rx: mpsc::Receiver<DocumentChange>, pump: Option<JoinHandle<()>>) -> Self {
        Self { rx, pump }
    }

    /// Next committed snapshot; `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<DocumentChange> {
        self.rx.recv().await
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// The document store contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read by id.
    async fn fetch(&self, id: &DocumentId) -> Result<Document, StoreError>;

    /// Insert a freshly created document.
    async fn create(&self, doc: &Document) -> Result<(), StoreError>;

    /// Conditional update by id with a partial field set.
    async fn update(&self, id: &DocumentId, patch: DocumentPatch) -> Result<(), StoreError>;

    /// Delete by id. No soft-delete, no versioning.
    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError>;

    /// All documents owned by `owner_id`, newest first.
    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Document>, StoreError>;

    /// Subscribe to committed updates for one document.
    async fn subscribe(&self, id: &DocumentId) -> Result<ChangeFeed, StoreError>;
}
