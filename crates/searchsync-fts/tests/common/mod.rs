//! Common test utilities and harness for searchsync-fts integration tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use searchsync_core::Result;
use searchsync_fts::{
    ChangedFields, FieldValue, IndexBackend, MemoryBackend, ModelConfig, NativeDirtyBridge,
    NativeDirtyState, ObservedFields, RecordId, RecordStore, SearchCoordinator,
    SearchableDeclaration, SearchableRecord,
};

/// Midnight UTC on the given day of September 2008.
pub fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2008, 9, day, 0, 0, 0).unwrap()
}

// ============================================================================
// Article: self-made change tracking, with an `Announcement` subtype
// ============================================================================

#[derive(Debug, Clone)]
pub struct Article {
    pub id: i64,
    pub kind: &'static str,
    pub title: String,
    pub body: String,
    pub category: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    changes: ChangedFields,
}

impl Article {
    pub fn new(observed: ObservedFields, id: i64, title: &str, body: &str) -> Self {
        Self {
            id,
            kind: "Article",
            title: title.to_string(),
            body: body.to_string(),
            category: None,
            views: 0,
            created_at: day(1),
            updated_at: day(1),
            changes: ChangedFields::new(observed),
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.changes.assign("title", &mut self.title, title.to_string());
    }

    pub fn set_body(&mut self, body: &str) {
        self.changes.assign("body", &mut self.body, body.to_string());
    }

    pub fn set_category(&mut self, category: Option<&str>) {
        self.changes
            .assign("category", &mut self.category, category.map(str::to_string));
    }

    pub fn set_views(&mut self, views: i64) {
        self.changes.assign("views", &mut self.views, views);
    }

    pub fn set_updated_at(&mut self, updated_at: DateTime<Utc>) {
        self.changes
            .assign("updated_at", &mut self.updated_at, updated_at);
    }
}

impl SearchableRecord for Article {
    type Tracker = ChangedFields;

    fn table_name() -> &'static str {
        "articles"
    }

    fn field_names() -> &'static [&'static str] {
        &[
            "id",
            "title",
            "body",
            "category",
            "views",
            "created_at",
            "updated_at",
        ]
    }

    fn id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn type_name(&self) -> &str {
        self.kind
    }

    fn base_type_name(&self) -> Option<&str> {
        Some("Article")
    }

    fn field_value(&self, field: &str) -> FieldValue {
        match field {
            "id" => self.id.into(),
            "title" => self.title.as_str().into(),
            "body" => self.body.as_str().into(),
            "category" => self.category.clone().into(),
            "views" => self.views.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn tracker(&self) -> &ChangedFields {
        &self.changes
    }

    fn tracker_mut(&mut self) -> &mut ChangedFields {
        &mut self.changes
    }
}

/// In-memory stand-in for the relational table.
#[derive(Debug, Default)]
pub struct ArticleStore {
    rows: Mutex<Vec<Article>>,
}

impl ArticleStore {
    pub fn upsert(&self, article: &Article) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|row| row.id != article.id);
        rows.push(article.clone());
    }

    pub fn delete(&self, id: i64) {
        self.rows.lock().unwrap().retain(|row| row.id != id);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore<Article> for ArticleStore {
    async fn find_all(&self) -> Result<Vec<Article>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Article>> {
        let wanted: HashSet<&RecordId> = ids.iter().collect();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| wanted.contains(&row.id()))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Page: host-maintained dirty flags
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct HostDirtyFlags {
    pub dirty: HashSet<String>,
}

impl NativeDirtyState for HostDirtyFlags {
    fn is_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    fn clear(&mut self) {
        self.dirty.clear();
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub body: String,
    state: NativeDirtyBridge<HostDirtyFlags>,
}

impl Page {
    pub fn new(observed: ObservedFields, slug: &str, body: &str) -> Self {
        Self {
            slug: slug.to_string(),
            body: body.to_string(),
            state: NativeDirtyBridge::new(observed, HostDirtyFlags::default()),
        }
    }

    /// What the host persistence layer does on assignment.
    pub fn set_body(&mut self, body: &str) {
        if self.body != body {
            self.body = body.to_string();
            self.state.native_mut().dirty.insert("body".to_string());
        }
    }
}

impl SearchableRecord for Page {
    type Tracker = NativeDirtyBridge<HostDirtyFlags>;

    fn table_name() -> &'static str {
        "pages"
    }

    fn field_names() -> &'static [&'static str] {
        &["slug", "body"]
    }

    fn id(&self) -> RecordId {
        RecordId::from(self.slug.as_str())
    }

    fn parse_id(value: &str) -> RecordId {
        RecordId::from(value)
    }

    fn type_name(&self) -> &str {
        "Page"
    }

    fn field_value(&self, field: &str) -> FieldValue {
        match field {
            "slug" => self.slug.as_str().into(),
            "body" => self.body.as_str().into(),
            _ => FieldValue::Null,
        }
    }

    fn tracker(&self) -> &Self::Tracker {
        &self.state
    }

    fn tracker_mut(&mut self) -> &mut Self::Tracker {
        &mut self.state
    }
}

/// In-memory stand-in for the pages table.
#[derive(Debug, Default)]
pub struct PageStore {
    rows: Mutex<Vec<Page>>,
}

impl PageStore {
    pub fn upsert(&self, page: &Page) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|row| row.slug != page.slug);
        rows.push(page.clone());
    }
}

#[async_trait]
impl RecordStore<Page> for PageStore {
    async fn find_all(&self) -> Result<Vec<Page>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Page>> {
        let wanted: HashSet<&RecordId> = ids.iter().collect();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| wanted.contains(&row.id()))
            .cloned()
            .collect())
    }
}

/// A page coordinator over a fresh in-memory node.
pub fn page_coordinator() -> (Arc<MemoryBackend>, SearchCoordinator<Page>) {
    let config = ModelConfig::resolve::<Page>(&SearchableDeclaration::default()).unwrap();
    let backend = Arc::new(MemoryBackend::new("test_pages"));
    let shared: Arc<dyn IndexBackend> = Arc::clone(&backend) as Arc<dyn IndexBackend>;
    let coordinator = SearchCoordinator::with_backend(config, shared, "test_pages");
    (backend, coordinator)
}

// ============================================================================
// Harness
// ============================================================================

/// Declaration used by most tests.
pub fn article_declaration() -> SearchableDeclaration {
    SearchableDeclaration::default()
        .searchable_fields(["title", "body"])
        .attribute("title")
        .attribute("category")
}

/// Test harness wiring an article coordinator to an in-memory node.
pub struct TestHarness {
    pub backend: Arc<MemoryBackend>,
    pub coordinator: SearchCoordinator<Article>,
    pub store: ArticleStore,
}

impl TestHarness {
    /// Creates a harness with [`article_declaration`].
    pub fn new() -> Self {
        Self::with_declaration(article_declaration())
    }

    /// Creates a harness with a custom declaration.
    pub fn with_declaration(declaration: SearchableDeclaration) -> Self {
        let config = ModelConfig::resolve::<Article>(&declaration).unwrap();
        let backend = Arc::new(MemoryBackend::new("test_articles"));
        let shared: Arc<dyn IndexBackend> = Arc::clone(&backend) as Arc<dyn IndexBackend>;
        let coordinator = SearchCoordinator::with_backend(config, shared, "test_articles");
        Self {
            backend,
            coordinator,
            store: ArticleStore::default(),
        }
    }

    /// A new, unsaved article.
    pub fn article(&self, id: i64, title: &str, body: &str) -> Article {
        Article::new(self.coordinator.observed_fields(), id, title, body)
    }

    /// Insert the article and run the save hooks.
    pub async fn create(&self, mut article: Article) -> Article {
        self.store.upsert(&article);
        self.coordinator.on_saved(&mut article, true).await.unwrap();
        article
    }

    /// Persist changes to the article and run the save hooks.
    pub async fn save(&self, article: &mut Article) {
        self.store.upsert(article);
        self.coordinator.on_saved(article, false).await.unwrap();
    }

    /// Delete the article and run the destroy hook.
    pub async fn destroy(&self, article: &Article) {
        self.store.delete(article.id);
        self.coordinator.after_destroy(article).await.unwrap();
    }

    /// Number of index documents carrying `db_id = id`.
    pub fn documents_for(&self, id: i64) -> usize {
        let id = RecordId::Int(id);
        self.backend
            .documents()
            .iter()
            .filter(|doc| doc.db_id().as_ref() == Some(&id))
            .count()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
