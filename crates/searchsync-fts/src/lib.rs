//! Index synchronization core for Searchsync.
//!
//! Keeps a full-text index node in step with the rows of a relational table
//! and answers searches over it. The relational layer stays with the host:
//! records come in through [`SearchableRecord`] and [`RecordStore`], and the
//! host calls the [`SearchCoordinator`] hooks after each persisted change.
//!
//! # Features
//!
//! - `backend-http` (default): `NodeBackend`, the HTTP client for a remote node
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      searchsync-fts                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchCoordinator (hooks, reindex, search)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ChangeTracker        when to reindex                       │
//! │  ├── ChangedFields (self-made change set)                   │
//! │  └── NativeDirtyBridge (host dirty flags)                   │
//! │  DocumentBuilder      what gets indexed                     │
//! │  SearchCondition      tokenized phrase, filters, order      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IndexBackend trait                                         │
//! │  ├── MemoryBackend (in-process)                             │
//! │  └── NodeBackend (HTTP, draft wire format)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use searchsync_core::ConnectionConfig;
//! use searchsync_fts::{SearchCoordinator, SearchOptions, SearchableDeclaration};
//!
//! let declaration = SearchableDeclaration::default()
//!     .searchable_fields(["title", "body"])
//!     .attribute("title");
//! let coordinator = SearchCoordinator::<Article>::setup(&declaration, &ConnectionConfig::load(None)?)?;
//!
//! // After the host saved `article`:
//! coordinator.on_saved(&mut article, created).await?;
//!
//! let options = SearchOptions {
//!     order: Some("updated_at DESC".to_string()),
//!     ..Default::default()
//! };
//! let outcome = coordinator.search(&store, "ruby vim", &options).await?;
//! ```

pub mod backend;
pub mod condition;
pub mod coordinator;
pub mod document;
pub mod draft;
pub mod memory;
pub mod model;
pub mod query;
pub mod tracker;
pub mod types;

// Feature-gated HTTP backend
#[cfg(feature = "backend-http")]
pub mod node;

// Re-exports
pub use backend::{IndexBackend, create_backend};
pub use condition::{COUNT_ONLY_MAX, SearchCondition, SearchOptions};
pub use coordinator::{RecordStore, SearchCoordinator, SearchOutcome};
pub use document::{DocumentBuilder, IndexDocument};
pub use memory::MemoryBackend;
pub use model::{ModelConfig, SearchableDeclaration, SearchableRecord};
pub use query::tokenize;
pub use tracker::{ChangeTracker, ChangedFields, NativeDirtyBridge, NativeDirtyState, ObservedFields};
pub use types::{FieldValue, RecordId};

#[cfg(feature = "backend-http")]
pub use node::NodeBackend;
