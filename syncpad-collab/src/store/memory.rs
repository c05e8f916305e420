//! In-memory document store with per-document change fan-out.
//!
//! Serves offline use and the integration suites: two engines sharing one
//! `MemoryStore` behave like two tabs on one hosted row. Each document gets
//! its own broadcast channel so feeds are isolated between documents.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use syncpad_core::{Document, DocumentChange, DocumentId, DocumentPatch};

use super::{ChangeFeed, DocumentStore, StoreError};

/// Operation counters, for monitoring and for asserting write behavior in
/// tests. Tracked via atomics so the hot paths never take an extra lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub fetches: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
}

#[derive(Default)]
struct AtomicStoreStats {
    fetches: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
}

/// In-memory store backend.
pub struct MemoryStore {
    rows: RwLock<HashMap<DocumentId, Document>>,
    feeds: RwLock<HashMap<DocumentId, broadcast::Sender<DocumentChange>>>,
    feed_capacity: usize,
    stats: Arc<AtomicStoreStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// `feed_capacity` bounds how many snapshots a slow subscriber may lag
    /// behind before older ones are dropped.
    pub fn with_capacity(feed_capacity: usize) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            feeds: RwLock::new(HashMap::new()),
            feed_capacity,
            stats: Arc::new(AtomicStoreStats::default()),
        }
    }

    /// Snapshot of the operation counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            fetches: self.stats.fetches.load(Ordering::Relaxed),
            inserts: self.stats.inserts.load(Ordering::Relaxed),
            updates: self.stats.updates.load(Ordering::Relaxed),
            deletes: self.stats.deletes.load(Ordering::Relaxed),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Get or create the fan-out channel for one document.
    async fn feed_sender(&self, id: &DocumentId) -> broadcast::Sender<DocumentChange> {
        {
            let feeds = self.feeds.read().await;
            if let Some(tx) = feeds.get(id) {
                return tx.clone();
            }
        }

        let mut feeds = self.feeds.write().await;
        // Double-check after acquiring the write lock.
        if let Some(tx) = feeds.get(id) {
            return tx.clone();
        }
        let (tx, _) = broadcast::channel(self.feed_capacity);
        feeds.insert(id.clone(), tx.clone());
        tx
    }

    /// Publish the committed row to subscribers, if any.
    async fn notify(&self, doc: &Document) {
        let feeds = self.feeds.read().await;
        if let Some(tx) = feeds.get(&doc.id) {
            // No receivers is fine; the send result only counts them.
            let _ = tx.send(DocumentChange::from(doc));
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, id: &DocumentId) -> Result<Document, StoreError> {
        self.stats.fetches.fetch_add(1, Ordering::Relaxed);
        let rows = self.rows.read().await;
        rows.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn create(&self, doc: &Document) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&doc.id) {
            return Err(StoreError::WriteFailed(format!(
                "duplicate document id: {}",
                doc.id
            )));
        }
        rows.insert(doc.id.clone(), doc.clone());
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn update(&self, id: &DocumentId, patch: DocumentPatch) -> Result<(), StoreError> {
        let committed = {
            let mut rows = self.rows.write().await;
            let doc = rows
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            patch.apply_to(doc);
            doc.clone()
        };
        self.stats.updates.fetch_add(1, Ordering::Relaxed);
        self.notify(&committed).await;
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if rows.remove(id).is_none() {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.stats.deletes.fetch_add(1, Ordering::Relaxed);
        drop(rows);

        // Dropping the sender closes every subscriber's feed.
        self.feeds.write().await.remove(id);
        Ok(())
    }

    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Document>, StoreError> {
        let rows = self.rows.read().await;
        let mut owned: Vec<Document> = rows
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn subscribe(&self, id: &DocumentId) -> Result<ChangeFeed, StoreError> {
        let mut feed_rx = self.feed_sender(id).await.subscribe();
        let (tx, rx) = mpsc::channel(self.feed_capacity);
        let id = id.clone();

        let pump = tokio::spawn(async move {
            loop {
                match feed_rx.recv().await {
                    Ok(change) => {
                        if tx.send(change).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Each snapshot carries the full row, so skipping
                        // stale ones is safe.
                        log::warn!("feed for {id} lagged by {n} snapshots");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(ChangeFeed::new(rx, Some(pump)))
    }
}
