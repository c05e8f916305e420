//! Access-level resolution.
//!
//! A pure function of (identity, owner, share list). Mutation paths consult
//! the resolved level *before* any store call — rejection happens locally,
//! the hosted store's row-level security is the second line.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated identity as reported by the session oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl Identity {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// What one identity may do with one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// The creating user: full control including rename, delete, sharing.
    Owner,
    /// Invited via the share list: may edit content and switch slots.
    Collaborator,
    /// Everyone else: read-only.
    Viewer,
}

impl AccessLevel {
    /// Resolve the level for `identity` on a document.
    ///
    /// Ownership is checked by user id; collaboration by email membership
    /// (case-insensitive — the share list is stored lower-case). An absent
    /// identity is always a viewer.
    pub fn resolve(identity: Option<&Identity>, owner_id: Uuid, shared_emails: &[String]) -> Self {
        match identity {
            Some(id) if id.user_id == owner_id => AccessLevel::Owner,
            Some(id)
                if shared_emails
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(&id.email)) =>
            {
                AccessLevel::Collaborator
            }
            _ => AccessLevel::Viewer,
        }
    }

    /// May edit slot content and switch the active language.
    pub fn can_edit(self) -> bool {
        !matches!(self, AccessLevel::Viewer)
    }

    /// May rename, delete, and modify the share list.
    pub fn can_manage(self) -> bool {
        matches!(self, AccessLevel::Owner)
    }
}
