//! Index backend trait and factory.
//!
//! An [`IndexBackend`] is one logical index node: it stores
//! [`IndexDocument`]s and answers [`SearchCondition`]s.
//!
//! # Backends
//!
//! - `NodeBackend`: remote node over HTTP (requires the `backend-http` feature)
//! - [`MemoryBackend`]: in-process engine for tests and local development
//!
//! # Example
//!
//! ```rust,ignore
//! use searchsync_core::ConnectionConfig;
//! use searchsync_fts::{create_backend, SearchCondition, SearchOptions};
//!
//! let config = ConnectionConfig::load(None)?;
//! let backend = create_backend(&config, &config.node_name("articles"))?;
//!
//! let condition = SearchCondition::build("ruby vim", &SearchOptions::default())?;
//! let documents = backend.search(&condition).await?;
//! println!("{} matches", documents.len());
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use searchsync_core::{ConnectionConfig, Error, Result};

use crate::condition::SearchCondition;
use crate::document::IndexDocument;
use crate::memory::MemoryBackend;
use crate::types::RecordId;

/// Abstract index backend.
///
/// Every mutation is a single call awaited by the caller. Implementations hold
/// no per-record state, so one instance is shared by `Arc` across callers.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// Insert a document, replacing one with the same URI.
    async fn add(&self, document: &IndexDocument) -> Result<()>;

    /// Delete the document whose `db_id` is `id`. Absent documents are a no-op.
    async fn remove(&self, id: &RecordId) -> Result<()>;

    /// Matching documents in result order.
    ///
    /// "No hits" and "no index yet" are an empty vector, not an error.
    async fn search(&self, condition: &SearchCondition) -> Result<Vec<IndexDocument>>;

    /// Number of matching documents.
    async fn count(&self, condition: &SearchCondition) -> Result<usize>;

    /// Remove every record-backed document; returns how many were removed.
    async fn clear(&self) -> Result<usize>;

    /// Replace the document of `id` with `document`.
    ///
    /// Remove then add, not atomic: a failure in between leaves the record
    /// unindexed until the next forced reindex.
    async fn update(&self, id: &RecordId, document: &IndexDocument) -> Result<()> {
        self.remove(id).await?;
        self.add(document).await
    }

    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Check if the backend is ready to handle requests.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Create the backend named by `config.backend` for one node.
///
/// | `backend` | Implementation |
/// |-----------|----------------|
/// | `estraier`, `http` | `NodeBackend` |
/// | `memory` | [`MemoryBackend`] |
///
/// # Errors
///
/// Returns [`Error::Config`] for an unknown backend name, or when the HTTP
/// backend is requested without the `backend-http` feature.
pub fn create_backend(config: &ConnectionConfig, node: &str) -> Result<Arc<dyn IndexBackend>> {
    log::debug!("Creating '{}' index backend for node '{node}'", config.backend);
    match config.backend.as_str() {
        #[cfg(feature = "backend-http")]
        "estraier" | "http" => Ok(Arc::new(crate::node::NodeBackend::new(config, node)?)),
        #[cfg(not(feature = "backend-http"))]
        "estraier" | "http" => Err(Error::config(
            "the HTTP node backend requires the 'backend-http' feature",
        )),
        "memory" => Ok(Arc::new(MemoryBackend::new(node))),
        other => Err(Error::config(format!("unsupported index backend '{other}'"))),
    }
}

// ============================================================================
// Tests
// ============================================================================
