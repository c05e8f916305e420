//! # syncpad-collab — document sync core for the syncpad code pad
//!
//! Multiplexes one hosted document row across language slots, debounces
//! and deduplicates writes, and reconciles server-pushed change
//! notifications against locally in-flight edits.
//!
//! ## Architecture
//!
//! ```text
//!  keystrokes                                   other clients
//!      │                                              │
//!      ▼                                              ▼
//! ┌────────────┐  debounced full-map write  ┌──────────────────┐
//! │ SyncEngine │ ─────────────────────────► │  DocumentStore   │
//! │ (per doc)  │                            │  (REST / memory) │
//! └─────┬──────┘ ◄───────────────────────── └──────────────────┘
//!       │          change feed (echo-filtered)
//!       ▼
//!   EngineEvent stream → UI
//! ```
//!
//! ## Modules
//!
//! - [`engine`] — per-document sync engine: debounce, echo filter, slots
//! - [`store`] — store contract, REST backend, in-memory backend
//! - [`share`] — owner-only collaborator-list surface
//! - [`files`] — list/create/delete over the signed-in user's documents
//! - [`session`] — session oracle trait and a static implementation
//! - [`config`] — store endpoints and engine tunables
//!
//! Concurrency model: a single logical writer per client per document —
//! at most one armed debounced write, a new edit aborts and supersedes
//! it. Cross-client conflicts resolve last-write-wins on the full
//! content map at the store.

pub mod config;
pub mod engine;
pub mod files;
pub mod session;
pub mod share;
pub mod store;

pub use config::{EngineConfig, MissingConfig, StoreConfig};
pub use engine::{EngineError, EngineEvent, SyncEngine};
pub use files::{CatalogError, FileCatalog};
pub use session::{SessionOracle, StaticSession};
pub use store::{ChangeFeed, DocumentStore, MemoryStore, RestStore, StoreError, StoreStats};
