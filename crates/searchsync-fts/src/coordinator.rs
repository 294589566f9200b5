//! Index maintenance and search for one record type.
//!
//! [`SearchCoordinator`] ties a record type's [`ModelConfig`] to an
//! [`IndexBackend`]. It decides when a record is reindexed, builds its
//! document, and turns search results back into records through the host's
//! [`RecordStore`].
//!
//! # Lifecycle hooks
//!
//! The host persistence layer calls the hooks after the corresponding
//! operation has committed:
//!
//! | Hook | Index work |
//! |------|------------|
//! | [`after_create`](SearchCoordinator::after_create) | add |
//! | [`after_update`](SearchCoordinator::after_update) | remove + add, when an observed field changed |
//! | [`after_destroy`](SearchCoordinator::after_destroy) | remove |
//! | [`after_save`](SearchCoordinator::after_save) | none; clears change tracking |
//!
//! With `auto_update = false` the first three do nothing and indexing is left
//! to [`update_index`](SearchCoordinator::update_index) and
//! [`reindex_all`](SearchCoordinator::reindex_all).
//!
//! Index work happens outside the host's transaction. A failed index call
//! does not undo the record mutation.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use searchsync_core::{ConnectionConfig, Result};

use crate::backend::{IndexBackend, create_backend};
use crate::condition::{SearchCondition, SearchOptions};
use crate::document::{DB_ID, DocumentBuilder, IndexDocument};
use crate::model::{ModelConfig, SearchableDeclaration, SearchableRecord};
use crate::tracker::{ChangeTracker, ObservedFields};
use crate::types::RecordId;

/// Host access to persisted records.
#[async_trait]
pub trait RecordStore<R>: Send + Sync {
    /// Every record of the type.
    async fn find_all(&self) -> Result<Vec<R>>;

    /// Records with the given ids, in any order. Missing ids are skipped.
    async fn find_by_ids(&self, ids: &[RecordId]) -> Result<Vec<R>>;
}

/// Result of [`SearchCoordinator::search`], shaped by the options.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<R> {
    /// Matching records in index order.
    Records(Vec<R>),
    /// Matching index documents (`raw_matches`).
    Raw(Vec<IndexDocument>),
    /// Number of matches (`count`).
    Count(usize),
}

impl<R> SearchOutcome<R> {
    /// Number of records or documents, or the count itself.
    pub fn len(&self) -> usize {
        match self {
            SearchOutcome::Records(records) => records.len(),
            SearchOutcome::Raw(documents) => documents.len(),
            SearchOutcome::Count(count) => *count,
        }
    }

    /// Returns `true` when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The records, if this is a record result.
    pub fn into_records(self) -> Option<Vec<R>> {
        match self {
            SearchOutcome::Records(records) => Some(records),
            _ => None,
        }
    }
}

/// Index coordinator for record type `R`.
pub struct SearchCoordinator<R> {
    config: Arc<ModelConfig>,
    backend: Arc<dyn IndexBackend>,
    builder: DocumentBuilder,
    node: String,
    _record: PhantomData<fn() -> R>,
}

impl<R: SearchableRecord> SearchCoordinator<R> {
    /// Resolve the declaration and connect to the record type's node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](searchsync_core::Error::Config) for an
    /// invalid declaration or an unsupported backend.
    pub fn setup(
        declaration: &SearchableDeclaration,
        connection: &ConnectionConfig,
    ) -> Result<Self> {
        let config = ModelConfig::resolve::<R>(declaration)?;
        let node = connection.node_name(R::table_name());
        let backend = create_backend(connection, &node)?;
        log::info!(
            "Searchable model '{}' bound to node '{node}' ({} backend)",
            R::table_name(),
            backend.name()
        );
        Ok(Self::with_backend(config, backend, node))
    }

    /// Use an already constructed backend.
    pub fn with_backend(
        config: ModelConfig,
        backend: Arc<dyn IndexBackend>,
        node: impl Into<String>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            builder: DocumentBuilder::new(Arc::clone(&config)),
            config,
            backend,
            node: node.into(),
            _record: PhantomData,
        }
    }

    /// Resolved model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Name of the node this coordinator writes to.
    pub fn node_name(&self) -> &str {
        &self.node
    }

    /// The index backend.
    pub fn backend(&self) -> &Arc<dyn IndexBackend> {
        &self.backend
    }

    /// Observed fields, for constructing record trackers.
    pub fn observed_fields(&self) -> ObservedFields {
        self.config.observed_fields()
    }

    /// The document `record` is indexed as.
    pub fn document_for(&self, record: &R) -> Result<IndexDocument> {
        self.builder.build(record)
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Search, shaping the result by `options`.
    ///
    /// Records are returned in index order; ids the store no longer knows are
    /// skipped.
    pub async fn search<S>(
        &self,
        store: &S,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome<R>>
    where
        S: RecordStore<R> + ?Sized,
    {
        options.validate()?;
        if options.count {
            return Ok(SearchOutcome::Count(self.search_count(query, options).await?));
        }
        if options.raw_matches {
            return Ok(SearchOutcome::Raw(self.search_raw(query, options).await?));
        }

        let ids = self.search_ids(query, options).await?;
        if ids.is_empty() {
            return Ok(SearchOutcome::Records(Vec::new()));
        }

        let mut found: HashMap<RecordId, R> = store
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|record| (record.id(), record))
            .collect();
        let records: Vec<R> = ids.iter().filter_map(|id| found.remove(id)).collect();
        if records.len() < ids.len() {
            log::debug!(
                "{} indexed id(s) of '{}' no longer in the store",
                ids.len() - records.len(),
                self.config.table()
            );
        }
        Ok(SearchOutcome::Records(records))
    }

    /// Record ids of the matches, in index order and without repeats.
    pub async fn search_ids(&self, query: &str, options: &SearchOptions) -> Result<Vec<RecordId>> {
        let documents = self.search_raw(query, options).await?;
        let mut seen = HashSet::new();
        Ok(documents
            .iter()
            .filter_map(|document| document.attribute(DB_ID).map(R::parse_id))
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    /// Matching index documents.
    pub async fn search_raw(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<IndexDocument>> {
        let options = SearchOptions {
            count: false,
            ..options.clone()
        };
        let condition = SearchCondition::build(query, &options)?;
        self.backend.search(&condition).await
    }

    /// Number of matches; `limit` and `offset` are ignored.
    pub async fn search_count(&self, query: &str, options: &SearchOptions) -> Result<usize> {
        let condition = SearchCondition::count_only(query, options)?;
        self.backend.count(&condition).await
    }

    // ------------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------------

    /// Reindex every record in the store; returns how many were indexed.
    pub async fn reindex_all<S>(&self, store: &S) -> Result<usize>
    where
        S: RecordStore<R> + ?Sized,
    {
        let records = store.find_all().await?;
        log::info!(
            "Reindexing {} record(s) of '{}' into node '{}'",
            records.len(),
            self.config.table(),
            self.node
        );
        let mut indexed = 0;
        for record in &records {
            if self.update_index(record, true).await? {
                indexed += 1;
            }
        }
        log::info!("Reindexed {indexed} record(s) of '{}'", self.config.table());
        Ok(indexed)
    }

    /// Remove every record-backed document from the node.
    pub async fn clear_index(&self) -> Result<usize> {
        let removed = self.backend.clear().await?;
        log::info!(
            "Cleared {removed} document(s) of '{}' from node '{}'",
            self.config.table(),
            self.node
        );
        Ok(removed)
    }

    /// Replace the record's document when forced or when an observed field
    /// changed. Returns whether the index was touched.
    pub async fn update_index(&self, record: &R, force: bool) -> Result<bool> {
        if !force && !record.tracker().needs_update(None) {
            return Ok(false);
        }
        let document = self.builder.build(record)?;
        self.backend.update(&record.id(), &document).await?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------------

    /// The record was inserted.
    pub async fn after_create(&self, record: &R) -> Result<()> {
        if !self.config.auto_update() {
            return Ok(());
        }
        self.backend.add(&self.builder.build(record)?).await
    }

    /// The record was updated; reindexes when an observed field changed.
    pub async fn after_update(&self, record: &R) -> Result<bool> {
        if !self.config.auto_update() {
            return Ok(false);
        }
        self.update_index(record, false).await
    }

    /// The record was deleted.
    pub async fn after_destroy(&self, record: &R) -> Result<()> {
        if !self.config.auto_update() {
            return Ok(());
        }
        let id = record.id();
        id.check_indexable()?;
        self.backend.remove(&id).await
    }

    /// Any save finished. Clears change tracking, whatever `auto_update` says.
    pub fn after_save(&self, record: &mut R) {
        record.tracker_mut().clear_changed();
    }

    /// Run the create or update hook, then [`after_save`](Self::after_save).
    ///
    /// Tracking is cleared even when the index call fails; the index error is
    /// returned afterwards.
    pub async fn on_saved(&self, record: &mut R, created: bool) -> Result<()> {
        let result = if created {
            self.after_create(record).await
        } else {
            self.after_update(record).await.map(|_| ())
        };
        self.after_save(record);
        result
    }
}

impl<R> std::fmt::Debug for SearchCoordinator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCoordinator")
            .field("table", &self.config.table())
            .field("node", &self.node)
            .field("backend", &self.backend.name())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
