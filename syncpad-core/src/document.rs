//! Document records and their partial-update / change-notification shapes.
//!
//! A `Document` mirrors one row of the hosted store's `documents` table.
//! Writes go out as a `DocumentPatch` (only the touched fields), and the
//! change feed delivers `DocumentChange` snapshots of the committed row.

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::Language;

/// Short opaque document identifier.
///
/// Generated once at creation time from a v4 UUID truncated to 8 hex chars:
/// unguessable enough for a share link, short enough for a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        DocumentId(hex[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        DocumentId(s)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One document row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Identity of the creating user; immutable after creation.
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    /// Display name; mutable only by the owner.
    pub file_name: String,
    /// Currently active slot. `None` means never explicitly selected;
    /// readers fall back to [`Language::default`].
    #[serde(default)]
    pub language: Option<Language>,
    /// Full text content per slot. Slots absent from the map resolve to
    /// their fixed default.
    #[serde(default)]
    pub language_content: HashMap<Language, String>,
    /// Emails granted edit access by the owner. Never contains the owner's
    /// own email; duplicates forbidden.
    #[serde(default)]
    pub shared_emails: Vec<String>,
    /// Creation time, seconds since epoch; immutable.
    pub created_at: u64,
}

impl Document {
    /// Create an empty document owned by `owner_id`.
    ///
    /// All slots start at their defaults (the content map is empty) and the
    /// active slot is the fallback.
    pub fn new(owner_id: Uuid, file_name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::generate(),
            owner_id,
            file_name: file_name.into(),
            language: Some(Language::default()),
            language_content: HashMap::new(),
            shared_emails: Vec::new(),
            created_at: unix_now(),
        }
    }

    /// The active slot, falling back when unset.
    pub fn active_language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    /// Content for `slot`, substituting the slot default when absent.
    pub fn content_for(&self, slot: Language) -> String {
        self.language_content
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| slot.default_content().to_string())
    }
}

/// Partial field set for a conditional update. `None` fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_content: Option<HashMap<Language, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_emails: Option<Vec<String>>,
}

impl DocumentPatch {
    /// Full content map plus the active slot, the shape of a debounced save.
    pub fn content(map: HashMap<Language, String>, active: Language) -> Self {
        Self {
            language_content: Some(map),
            language: Some(active),
            ..Self::default()
        }
    }

    pub fn language(language: Language) -> Self {
        Self {
            language: Some(language),
            ..Self::default()
        }
    }

    pub fn file_name(name: impl Into<String>) -> Self {
        Self {
            file_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn shared_emails(emails: Vec<String>) -> Self {
        Self {
            shared_emails: Some(emails),
            ..Self::default()
        }
    }

    /// True when no field is set; such a patch must not be sent.
    pub fn is_empty(&self) -> bool {
        self.language_content.is_none()
            && self.language.is_none()
            && self.file_name.is_none()
            && self.shared_emails.is_none()
    }

    /// Apply onto a document, the way the store commits it.
    pub fn apply_to(&self, doc: &mut Document) {
        if let Some(map) = &self.language_content {
            doc.language_content = map.clone();
        }
        if let Some(lang) = self.language {
            doc.language = Some(lang);
        }
        if let Some(name) = &self.file_name {
            doc.file_name = name.clone();
        }
        if let Some(emails) = &self.shared_emails {
            doc.shared_emails = emails.clone();
        }
    }
}

/// One change-feed snapshot: the committed row after an update.
///
/// `language_content` is `None` when the committed row carried no content
/// map at all; consumers skip such frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChange {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub language_content: Option<HashMap<Language, String>>,
    #[serde(default)]
    pub shared_emails: Option<Vec<String>>,
}

impl From<&Document> for DocumentChange {
    fn from(doc: &Document) -> Self {
        Self {
            language: doc.language,
            language_content: Some(doc.language_content.clone()),
            shared_emails: Some(doc.shared_emails.clone()),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
