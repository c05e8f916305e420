//! File catalog — the signed-in user's documents.
//!
//! Listing, creation, and owner-only deletion over the same document
//! store. Deletion is hard: no soft-delete, no versioning, no undo.

use std::sync::Arc;

use thiserror::Error;

use syncpad_core::{AccessLevel, Document, DocumentId, Identity};

use crate::session::SessionOracle;
use crate::store::{DocumentStore, StoreError};

/// Catalog operation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The signed-in user's view over their documents.
pub struct FileCatalog {
    store: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionOracle>,
}

impl FileCatalog {
    pub fn new(store: Arc<dyn DocumentStore>, session: Arc<dyn SessionOracle>) -> Self {
        Self { store, session }
    }

    async fn require_identity(&self) -> Result<Identity, CatalogError> {
        self.session
            .current_identity()
            .await
            .ok_or(CatalogError::PermissionDenied("sign in required"))
    }

    /// Documents owned by the current user, newest first.
    pub async fn list(&self) -> Result<Vec<Document>, CatalogError> {
        let me = self.require_identity().await?;
        Ok(self.store.list_owned(me.user_id).await?)
    }

    /// Create a fresh, empty document owned by the current user.
    pub async fn create(&self, file_name: impl Into<String>) -> Result<Document, CatalogError> {
        let me = self.require_identity().await?;
        let doc = Document::new(me.user_id, file_name);
        self.store.create(&doc).await?;
        log::info!("created {} for {}", doc.id, me.email);
        Ok(doc)
    }

    /// Delete a document. Owner-only, checked locally before the store
    /// call.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), CatalogError> {
        let me = self.require_identity().await?;
        let doc = match self.store.fetch(id).await {
            Ok(doc) => doc,
            Err(StoreError::NotFound(_)) => return Err(CatalogError::NotFound(id.clone())),
            Err(e) => return Err(e.into()),
        };

        let access = AccessLevel::resolve(Some(&me), doc.owner_id, &doc.shared_emails);
        if !access.can_manage() {
            return Err(CatalogError::PermissionDenied("only the owner can delete"));
        }

        self.store.delete(id).await?;
        log::info!("deleted {}", id);
        Ok(())
    }
}
