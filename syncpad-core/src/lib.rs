//! # syncpad-core — data model for the syncpad collaborative code pad
//!
//! Pure types and pure logic shared by the sync and execution layers:
//!
//! - [`document`] — document rows, partial updates, change-feed snapshots
//! - [`language`] — the closed language-slot enumeration and slot defaults
//! - [`access`] — identity and three-level access resolution
//! - [`share`] — collaborator-list validation and list operations
//!
//! Nothing here performs I/O; everything is deterministic and directly
//! testable.

pub mod access;
pub mod document;
pub mod language;
pub mod share;

pub use access::{AccessLevel, Identity};
pub use document::{Document, DocumentChange, DocumentId, DocumentPatch};
pub use language::{Language, UnknownLanguage};
pub use share::{add_email, is_valid_email, normalize_email, remove_email, ShareError};
