//! Integration tests for index maintenance: hooks, forced updates, reindexing.

use searchsync_core::{ConnectionConfig, Error};
use searchsync_fts::{SearchCoordinator, SearchOptions, SearchableDeclaration};

use crate::common::{Page, TestHarness, article_declaration, day, page_coordinator};

#[tokio::test]
async fn test_create_indexes_one_document() {
    let harness = TestHarness::new();
    harness.create(harness.article(1, "Ruby", "vim and emacs")).await;

    assert_eq!(harness.documents_for(1), 1);
    let doc = &harness.backend.documents()[0];
    assert_eq!(doc.texts, vec!["Ruby", "vim and emacs"]);
    assert_eq!(doc.attribute("@title"), Some("Ruby"));
    assert_eq!(doc.attribute("@uri"), Some("/Article/1"));
    assert_eq!(doc.attribute("@cdate"), Some("2008-09-01T00:00:00+00:00"));
    assert_eq!(doc.attribute("category"), Some(""));
}

#[tokio::test]
async fn test_forced_update_leaves_exactly_one_document() {
    let harness = TestHarness::new();
    let article = harness.create(harness.article(1, "Ruby", "vim")).await;

    for _ in 0..3 {
        assert!(harness
            .coordinator
            .update_index(&article, true)
            .await
            .unwrap());
    }
    assert_eq!(harness.documents_for(1), 1);
}

#[tokio::test]
async fn test_observed_change_reindexes() {
    let harness = TestHarness::new();
    let mut article = harness.create(harness.article(1, "Ruby", "vim")).await;

    article.set_body("emacs");
    article.set_category(Some("editors"));
    harness.save(&mut article).await;

    let docs = harness.backend.documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].texts, vec!["Ruby", "emacs"]);
    assert_eq!(docs[0].attribute("category"), Some("editors"));
}

#[tokio::test]
async fn test_unobserved_change_does_not_reindex() {
    let harness = TestHarness::new();
    let mut article = harness.create(harness.article(1, "Ruby", "vim")).await;
    let before = harness.backend.documents()[0].internal_id().map(str::to_string);

    article.set_views(100);
    assert!(!harness.coordinator.after_update(&article).await.unwrap());
    harness.save(&mut article).await;

    let after = harness.backend.documents()[0].internal_id().map(str::to_string);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_updated_at_change_refreshes_mdate() {
    let harness = TestHarness::new();
    let mut article = harness.create(harness.article(1, "Ruby", "vim")).await;
    assert_eq!(
        harness.backend.documents()[0].attribute("@mdate"),
        Some("2008-09-01T00:00:00+00:00")
    );

    article.set_updated_at(day(20));
    assert!(harness.coordinator.after_update(&article).await.unwrap());

    let docs = harness.backend.documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].attribute("@mdate"), Some("2008-09-20T00:00:00+00:00"));
}

#[tokio::test]
async fn test_if_changed_field_triggers_reindex() {
    let harness = TestHarness::with_declaration(article_declaration().if_changed(["views"]));
    let mut article = harness.create(harness.article(1, "Ruby", "vim")).await;

    article.set_views(100);
    assert!(harness.coordinator.after_update(&article).await.unwrap());
}

#[tokio::test]
async fn test_tracking_cleared_after_save() {
    let harness = TestHarness::new();
    let mut article = harness.create(harness.article(1, "Ruby", "vim")).await;

    article.set_title("Rails");
    harness.save(&mut article).await;
    assert!(!harness.coordinator.after_update(&article).await.unwrap());
}

#[tokio::test]
async fn test_destroy_removes_document() {
    let harness = TestHarness::new();
    let first = harness.create(harness.article(1, "Ruby", "vim")).await;
    harness.create(harness.article(2, "Rails", "web")).await;

    harness.destroy(&first).await;
    assert_eq!(harness.documents_for(1), 0);
    assert_eq!(harness.documents_for(2), 1);
}

#[tokio::test]
async fn test_manual_update_model() {
    let harness = TestHarness::with_declaration(article_declaration().manual_update());
    let mut article = harness.create(harness.article(1, "Ruby", "vim")).await;
    assert!(harness.backend.is_empty());

    article.set_title("Rails");
    harness.save(&mut article).await;
    assert!(harness.backend.is_empty());

    harness.coordinator.update_index(&article, true).await.unwrap();
    assert_eq!(harness.documents_for(1), 1);

    harness.destroy(&article).await;
    assert_eq!(harness.documents_for(1), 1);
}

#[tokio::test]
async fn test_reindex_all_matches_store() {
    let harness = TestHarness::with_declaration(article_declaration().manual_update());
    for id in 1..=5 {
        harness
            .create(harness.article(id, &format!("Title {id}"), "body"))
            .await;
    }
    assert!(harness.backend.is_empty());

    let indexed = harness.coordinator.reindex_all(&harness.store).await.unwrap();
    assert_eq!(indexed, 5);

    let count = harness
        .coordinator
        .search_count("", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(count, harness.store.len());
}

#[tokio::test]
async fn test_clear_index() {
    let harness = TestHarness::new();
    for id in 1..=3 {
        harness.create(harness.article(id, "Ruby", "vim")).await;
    }
    assert_eq!(harness.coordinator.clear_index().await.unwrap(), 3);
    assert!(harness.backend.is_empty());
}

#[tokio::test]
async fn test_subtype_document() {
    let harness = TestHarness::new();
    let mut announcement = harness.article(7, "Release", "1.0 is out");
    announcement.kind = "Announcement";
    announcement.updated_at = day(17);
    harness.create(announcement).await;

    let doc = &harness.backend.documents()[0];
    assert_eq!(doc.attribute("@uri"), Some("/Announcement/7"));
    assert_eq!(doc.attribute("type_base"), Some("Article"));
    assert_eq!(doc.attribute("@mdate"), Some("2008-09-17T00:00:00+00:00"));
}

// ----------------------------------------------------------------------------
// Host-maintained dirty flags
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_native_dirty_bridge_record() {
    let (backend, coordinator) = page_coordinator();

    let mut page = Page::new(coordinator.observed_fields(), "intro", "hello");
    coordinator.on_saved(&mut page, true).await.unwrap();
    assert_eq!(backend.len(), 1);

    // Unchanged: the bridge reports nothing dirty.
    assert!(!coordinator.after_update(&page).await.unwrap());

    page.set_body("hello again");
    coordinator.on_saved(&mut page, false).await.unwrap();
    let docs = backend.documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].texts, vec!["hello again"]);
    assert_eq!(docs[0].attribute("db_id"), Some("intro"));
    assert!(!coordinator.after_update(&page).await.unwrap());
}

#[tokio::test]
async fn test_id_with_whitespace_is_rejected() {
    let (backend, coordinator) = page_coordinator();

    let mut page = Page::new(coordinator.observed_fields(), "two words", "hello");
    let err = coordinator.on_saved(&mut page, true).await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("two words"));
    assert!(backend.is_empty());

    assert!(coordinator.update_index(&page, true).await.is_err());
    assert!(coordinator.after_destroy(&page).await.is_err());
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_setup_from_connection_config() {
    let connection = ConnectionConfig {
        backend: "memory".to_string(),
        node_prefix: Some("staging".to_string()),
        ..Default::default()
    };
    let coordinator =
        SearchCoordinator::<Page>::setup(&SearchableDeclaration::default(), &connection).unwrap();
    assert_eq!(coordinator.node_name(), "staging_pages");
    assert!(coordinator.backend().is_ready());
}
