//! Integration tests for the query path: ordering, paging, filters, modes.

use searchsync_core::Error;
use searchsync_fts::{RecordId, SearchOptions, SearchOutcome};

use crate::common::{Article, Page, PageStore, TestHarness, day, page_coordinator};

/// Three articles with increasing modification dates.
async fn seeded() -> TestHarness {
    let harness = TestHarness::new();
    let rows = [
        (1, "Ruby", "vim and emacs", Some("editors"), 15),
        (2, "Rails", "ruby on rails", Some("web"), 16),
        (3, "Emacs", "lisp editor", Some("editors"), 17),
    ];
    for (id, title, body, category, updated) in rows {
        let mut article = harness.article(id, title, body);
        article.category = category.map(str::to_string);
        article.updated_at = day(updated);
        harness.create(article).await;
    }
    harness
}

fn ids(records: &[Article]) -> Vec<i64> {
    records.iter().map(|a| a.id).collect()
}

async fn records(harness: &TestHarness, query: &str, options: &SearchOptions) -> Vec<Article> {
    harness
        .coordinator
        .search(&harness.store, query, options)
        .await
        .unwrap()
        .into_records()
        .unwrap()
}

#[tokio::test]
async fn test_order_by_mdate_descending() {
    let harness = seeded().await;
    let options = SearchOptions {
        order: Some("@mdate NUMD".to_string()),
        ..Default::default()
    };
    assert_eq!(ids(&records(&harness, "", &options).await), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_order_shorthand() {
    let harness = seeded().await;
    let options = SearchOptions {
        order: Some("updated_at DESC".to_string()),
        ..Default::default()
    };
    assert_eq!(ids(&records(&harness, "", &options).await), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_paging_ascending() {
    let harness = seeded().await;
    let options = SearchOptions {
        order: Some("@mdate NUMA".to_string()),
        limit: 2,
        offset: 1,
        ..Default::default()
    };
    assert_eq!(ids(&records(&harness, "", &options).await), vec![2, 3]);
}

#[tokio::test]
async fn test_phrase_search() {
    let harness = seeded().await;
    let found = records(&harness, "ruby", &SearchOptions::default()).await;
    assert_eq!(ids(&found), vec![1, 2]);

    let found = records(&harness, "\"ruby on rails\"", &SearchOptions::default()).await;
    assert_eq!(ids(&found), vec![2]);

    let found = records(&harness, "emacs ANDNOT lisp", &SearchOptions::default()).await;
    assert_eq!(ids(&found), vec![1]);
}

#[tokio::test]
async fn test_attribute_filter() {
    let harness = seeded().await;
    let options = SearchOptions::from_json(
        r#"{"attributes": "category STREQ editors", "order": "id asc"}"#,
    )
    .unwrap();
    assert_eq!(ids(&records(&harness, "", &options).await), vec![1, 3]);
}

#[tokio::test]
async fn test_count_mode() {
    let harness = seeded().await;
    let options = SearchOptions {
        count: true,
        limit: 1,
        ..Default::default()
    };
    let outcome = harness
        .coordinator
        .search(&harness.store, "editor", &options)
        .await
        .unwrap();
    assert!(matches!(outcome, SearchOutcome::Count(1)));

    let total = harness
        .coordinator
        .search_count("", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn test_raw_matches() {
    let harness = seeded().await;
    let options = SearchOptions {
        raw_matches: true,
        order: Some("id".to_string()),
        ..Default::default()
    };
    let outcome = harness
        .coordinator
        .search(&harness.store, "", &options)
        .await
        .unwrap();
    let SearchOutcome::Raw(documents) = outcome else {
        panic!("expected raw documents");
    };
    let uris: Vec<_> = documents.iter().filter_map(|d| d.uri()).collect();
    assert_eq!(uris, vec!["/Article/3", "/Article/2", "/Article/1"]);
}

#[tokio::test]
async fn test_search_ids() {
    let harness = seeded().await;
    let options = SearchOptions {
        order: Some("created_at".to_string()),
        ..Default::default()
    };
    let found = harness.coordinator.search_ids("rails", &options).await.unwrap();
    assert_eq!(found, vec![RecordId::Int(2)]);
}

#[tokio::test]
async fn test_deleted_rows_are_skipped() {
    let harness = seeded().await;
    // Row removed behind the coordinator's back: the index still has it.
    harness.store.delete(2);
    let options = SearchOptions {
        order: Some("@mdate NUMD".to_string()),
        ..Default::default()
    };
    assert_eq!(ids(&records(&harness, "", &options).await), vec![3, 1]);
}

#[tokio::test]
async fn test_no_matches() {
    let harness = seeded().await;
    let outcome = harness
        .coordinator
        .search(&harness.store, "haskell", &SearchOptions::default())
        .await
        .unwrap();
    assert!(outcome.is_empty());
}

#[tokio::test]
async fn test_conflicting_modes() {
    let harness = seeded().await;
    let options = SearchOptions {
        count: true,
        raw_matches: true,
        ..Default::default()
    };
    let err = harness
        .coordinator
        .search(&harness.store, "", &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_numeric_looking_string_id_is_found() {
    let (_backend, coordinator) = page_coordinator();
    let store = PageStore::default();

    let mut page = Page::new(coordinator.observed_fields(), "2024", "hello");
    store.upsert(&page);
    coordinator.on_saved(&mut page, true).await.unwrap();

    let ids = coordinator
        .search_ids("hello", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(ids, vec![RecordId::from("2024")]);

    let pages = coordinator
        .search(&store, "hello", &SearchOptions::default())
        .await
        .unwrap()
        .into_records()
        .unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].slug, "2024");
}
