//! The document sync engine — debounced writes, echo-filtered reads.
//!
//! One engine owns the in-memory mirror of one open document and mediates
//! every read and write between the editor and the store. Outgoing edits
//! run through a small write state machine:
//!
//! ```text
//!            on_local_edit            quiet interval
//!   Idle ───────────────► PendingWrite ─────────────► persist ──► Idle
//!    ▲                        │    ▲
//!    │     switch_slot /      │    │ on_local_edit
//!    └──── close (flush) ◄────┘    └─── (abort + re-arm)
//! ```
//!
//! Inbound, the change feed is filtered against `last_sent`: a snapshot
//! equal to this client's most recent write for that slot is the server
//! echo of our own commit and is discarded, so the editor never clobbers
//! an ongoing keystroke with a no-op replacement.
//!
//! Reference: Kleppmann — Designing Data-Intensive Applications, Chapter 5
//! (leaderless replication and read-your-writes).

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use syncpad_core::{
    AccessLevel, DocumentChange, DocumentId, DocumentPatch, Identity, Language, ShareError,
};

use crate::config::EngineConfig;
use crate::session::SessionOracle;
use crate::store::{ChangeFeed, DocumentStore, StoreError};

/// Events emitted by the sync engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A non-echo remote update replaced the active slot's content.
    RemoteContent { slot: Language, text: String },
    /// The collaborator list changed remotely.
    ShareListChanged(Vec<String>),
    /// A debounced write left for the store.
    Saving,
    /// The debounced write committed.
    Saved,
    /// A write failed. Local state is kept; the next keystroke re-arms the
    /// write, nothing retries automatically.
    SaveFailed(String),
    /// The change feed ended (teardown or transport loss).
    FeedClosed,
}

/// Engine operation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Mutable engine state, one lock for all of it.
pub(crate) struct EngineState {
    /// Authoritative local mirror of `language_content`.
    pub(crate) content: HashMap<Language, String>,
    /// The slot currently shown in the editor.
    pub(crate) active: Language,
    /// Per-slot value most recently written by this client — the inbound
    /// echo guard.
    pub(crate) last_sent: HashMap<Language, String>,
    pub(crate) file_name: String,
    pub(crate) owner_id: Uuid,
    pub(crate) shared_emails: Vec<String>,
    /// The armed debounce task, at most one.
    pub(crate) pending: Option<JoinHandle<()>>,
}

pub(crate) struct EngineShared {
    pub(crate) doc_id: DocumentId,
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) state: Mutex<EngineState>,
    pub(crate) events: mpsc::Sender<EngineEvent>,
}

/// One open document's sync engine.
pub struct SyncEngine {
    pub(crate) shared: Arc<EngineShared>,
    pub(crate) access: AccessLevel,
    pub(crate) identity: Option<Identity>,
    config: EngineConfig,
    event_rx: Option<mpsc::Receiver<EngineEvent>>,
    feed_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("access", &self.access)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Load the document and start the change-feed listener.
    ///
    /// Fails with [`EngineError::NotFound`] when the id does not resolve;
    /// the caller is responsible for redirecting.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        session: &dyn SessionOracle,
        doc_id: DocumentId,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let identity = session.current_identity().await;

        let doc = match store.fetch(&doc_id).await {
            Ok(doc) => doc,
            Err(StoreError::NotFound(_)) => return Err(EngineError::NotFound(doc_id)),
            Err(e) => return Err(e.into()),
        };

        let access = AccessLevel::resolve(identity.as_ref(), doc.owner_id, &doc.shared_emails);
        let active = doc.active_language();

        let mut content = doc.language_content.clone();
        content
            .entry(active)
            .or_insert_with(|| active.default_content().to_string());

        // The loaded value counts as "already sent": the store holds it.
        let mut last_sent = HashMap::new();
        last_sent.insert(active, content[&active].clone());

        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        let shared = Arc::new(EngineShared {
            doc_id: doc.id.clone(),
            store: store.clone(),
            state: Mutex::new(EngineState {
                content,
                active,
                last_sent,
                file_name: doc.file_name.clone(),
                owner_id: doc.owner_id,
                shared_emails: doc.shared_emails.clone(),
                pending: None,
            }),
            events: event_tx,
        });

        let feed = store.subscribe(&doc.id).await?;
        let feed_task = tokio::spawn(pump_feed(shared.clone(), feed));

        log::info!("opened {} as {:?}", doc.id, access);
        Ok(Self {
            shared,
            access,
            identity,
            config,
            event_rx: Some(event_rx),
            feed_task: Some(feed_task),
        })
    }

    /// Take the event receiver (can only be called once).
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<EngineEvent>> {
        self.event_rx.take()
    }

    /// Record a keystroke.
    ///
    /// The local mirror updates immediately; the store write is debounced.
    /// A new edit aborts and supersedes any armed write — within one quiet
    /// interval, exactly one write goes out, carrying the final text.
    pub async fn on_local_edit(&self, text: impl Into<String>) -> Result<(), EngineError> {
        if !self.access.can_edit() {
            return Err(EngineError::PermissionDenied("editing requires edit access"));
        }
        let text = text.into();

        let mut state = self.shared.state.lock().await;
        let active = state.active;
        state.content.insert(active, text);

        if let Some(armed) = state.pending.take() {
            armed.abort();
        }
        let shared = self.shared.clone();
        let quiet = self.config.debounce;
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            persist(&shared).await;
        }));
        Ok(())
    }

    /// Switch the visible slot, flushing any armed write first so no edit
    /// is lost when the slot pointer moves.
    ///
    /// Returns the text now visible. The local view always switches; the
    /// `language` field is only persisted with edit access.
    pub async fn switch_slot(&self, slot: Language) -> Result<String, EngineError> {
        self.flush().await;

        let text = {
            let mut state = self.shared.state.lock().await;
            state.active = slot;
            state
                .content
                .entry(slot)
                .or_insert_with(|| slot.default_content().to_string())
                .clone()
        };

        if self.access.can_edit() {
            if let Err(e) = self
                .shared
                .store
                .update(&self.shared.doc_id, DocumentPatch::language(slot))
                .await
            {
                log::warn!("language save failed for {}: {e}", self.shared.doc_id);
                let _ = self
                    .shared
                    .events
                    .send(EngineEvent::SaveFailed(e.to_string()))
                    .await;
            }
        }
        Ok(text)
    }

    /// Persist any armed debounced write immediately.
    pub async fn flush(&self) {
        let armed = { self.shared.state.lock().await.pending.take() };
        if let Some(handle) = armed {
            handle.abort();
            persist(&self.shared).await;
        }
    }

    /// Rename the document. Owner-only; a single point write, no debounce.
    pub async fn rename(&self, name: impl Into<String>) -> Result<(), EngineError> {
        if !self.access.can_manage() {
            return Err(EngineError::PermissionDenied("only the owner can rename"));
        }
        let name = name.into();
        self.shared
            .store
            .update(&self.shared.doc_id, DocumentPatch::file_name(name.clone()))
            .await?;
        self.shared.state.lock().await.file_name = name;
        Ok(())
    }

    /// Flush, then stop the change-feed listener. The preferred teardown.
    pub async fn close(mut self) {
        self.flush().await;
        if let Some(task) = self.feed_task.take() {
            task.abort();
        }
        log::debug!("closed {}", self.shared.doc_id);
    }

    // ─── Read surface ───────────────────────────────────────────────

    pub fn doc_id(&self) -> &DocumentId {
        &self.shared.doc_id
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The slot currently shown.
    pub async fn active_slot(&self) -> Language {
        self.shared.state.lock().await.active
    }

    /// Text of the active slot.
    pub async fn content(&self) -> String {
        let state = self.shared.state.lock().await;
        state.content.get(&state.active).cloned().unwrap_or_default()
    }

    /// Text of an arbitrary slot, substituting the slot default when the
    /// mirror has never seen it.
    pub async fn slot_content(&self, slot: Language) -> String {
        self.shared
            .state
            .lock()
            .await
            .content
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| slot.default_content().to_string())
    }

    pub async fn file_name(&self) -> String {
        self.shared.state.lock().await.file_name.clone()
    }

    pub async fn owner_id(&self) -> Uuid {
        self.shared.state.lock().await.owner_id
    }

    pub async fn shared_emails(&self) -> Vec<String> {
        self.shared.state.lock().await.shared_emails.clone()
    }

    /// Whether a debounced write is currently armed.
    pub async fn has_pending_write(&self) -> bool {
        self.shared.state.lock().await.pending.is_some()
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        // Without an async context there is nothing to flush; drop both
        // background activities so no stale callback outlives the view.
        if let Some(task) = self.feed_task.take() {
            task.abort();
        }
        if let Ok(mut state) = self.shared.state.try_lock() {
            if let Some(armed) = state.pending.take() {
                armed.abort();
            }
        }
    }
}

/// Write the full content map plus the active slot in one update.
///
/// The snapshot and the `last_sent` record happen under the lock; the
/// request itself runs lock-free so keystrokes keep landing while it is
/// in flight.
async fn persist(shared: &EngineShared) {
    let (snapshot, active) = {
        let mut state = shared.state.lock().await;
        state.pending = None;
        let active = state.active;
        let text = state.content.get(&active).cloned().unwrap_or_default();
        state.last_sent.insert(active, text);
        (state.content.clone(), active)
    };

    let _ = shared.events.send(EngineEvent::Saving).await;
    match shared
        .store
        .update(&shared.doc_id, DocumentPatch::content(snapshot, active))
        .await
    {
        Ok(()) => {
            let _ = shared.events.send(EngineEvent::Saved).await;
        }
        Err(e) => {
            log::warn!("save failed for {}: {e}", shared.doc_id);
            let _ = shared.events.send(EngineEvent::SaveFailed(e.to_string())).await;
        }
    }
}

/// Drain the change feed into the engine until it closes.
async fn pump_feed(shared: Arc<EngineShared>, mut feed: ChangeFeed) {
    while let Some(change) = feed.recv().await {
        apply_remote(&shared, change).await;
    }
    let _ = shared.events.send(EngineEvent::FeedClosed).await;
}

/// Apply one committed-row snapshot from the feed.
async fn apply_remote(shared: &EngineShared, change: DocumentChange) {
    // A frame without a content map carries nothing to reconcile.
    let Some(map) = change.language_content else {
        return;
    };
    let lang = change.language.unwrap_or_default();
    let incoming = map.get(&lang);

    let mut emitted = Vec::new();
    {
        let mut state = shared.state.lock().await;

        // Echo: the server reflecting our own just-applied write. Discard,
        // or the editor would clobber the caret with a no-op replacement.
        if incoming == state.last_sent.get(&lang) {
            log::trace!("echo suppressed for {} slot {lang}", shared.doc_id);
            return;
        }

        if let Some(emails) = change.shared_emails {
            if emails != state.shared_emails {
                state.shared_emails = emails.clone();
                emitted.push(EngineEvent::ShareListChanged(emails));
            }
        }

        if let Some(text) = incoming {
            state.content.insert(lang, text.clone());
            if lang == state.active {
                emitted.push(EngineEvent::RemoteContent {
                    slot: lang,
                    text: text.clone(),
                });
            }
            // Inactive slot: cached silently for the next switch.
        }
    }

    for event in emitted {
        let _ = shared.events.send(event).await;
    }
}
