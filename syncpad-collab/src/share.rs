//! Share registry — the owner-only mutation surface over the collaborator
//! list.
//!
//! Validation happens locally (never shipped to the store to fail there);
//! on success the full updated list goes out in one write, and the engine's
//! mirror is refreshed so a reopened share dialog shows the result without
//! waiting for the feed echo.

use syncpad_core::{add_email, remove_email, DocumentPatch, ShareError};

use crate::engine::{EngineError, SyncEngine};

impl SyncEngine {
    /// Grant edit access to an email address.
    ///
    /// Owner-only. The address is trimmed, lower-cased, and validated;
    /// duplicates are rejected with [`ShareError::AlreadyShared`] so the
    /// caller can tell the user, and the owner's own address is refused —
    /// ownership confers access independently of this list.
    ///
    /// Returns the updated list.
    pub async fn add_collaborator(&self, raw: &str) -> Result<Vec<String>, EngineError> {
        if !self.access.can_manage() {
            return Err(EngineError::PermissionDenied("only the owner can share"));
        }

        if let Some(identity) = &self.identity {
            if identity.email.eq_ignore_ascii_case(raw.trim()) {
                return Err(
                    ShareError::AlreadyShared(identity.email.to_ascii_lowercase()).into(),
                );
            }
        }

        let current = { self.shared.state.lock().await.shared_emails.clone() };
        let updated = add_email(&current, raw)?;

        self.shared
            .store
            .update(
                &self.shared.doc_id,
                DocumentPatch::shared_emails(updated.clone()),
            )
            .await?;

        self.shared.state.lock().await.shared_emails = updated.clone();
        log::info!(
            "shared {} ({} collaborators)",
            self.shared.doc_id,
            updated.len()
        );
        Ok(updated)
    }

    /// Revoke edit access for an email address.
    ///
    /// Owner-only. An address that was never shared reports
    /// [`ShareError::NotShared`]; callers may surface it without treating
    /// it as fatal. Returns the updated list.
    pub async fn remove_collaborator(&self, raw: &str) -> Result<Vec<String>, EngineError> {
        if !self.access.can_manage() {
            return Err(EngineError::PermissionDenied("only the owner can share"));
        }

        let current = { self.shared.state.lock().await.shared_emails.clone() };
        let updated = remove_email(&current, raw)?;

        self.shared
            .store
            .update(
                &self.shared.doc_id,
                DocumentPatch::shared_emails(updated.clone()),
            )
            .await?;

        self.shared.state.lock().await.shared_emails = updated.clone();
        log::info!("unshared {} from {}", self.shared.doc_id, raw.trim());
        Ok(updated)
    }
}
