//! Handler functions for the CLI subcommands.
//!
//! Each handler resolves the node for a table, creates the configured
//! backend and performs one operation. Output formatting stays in `main`.

use anyhow::{Context, Result};
use searchsync_core::ConnectionConfig;
use searchsync_fts::{IndexBackend, IndexDocument, SearchCondition, SearchOptions, create_backend};
use std::sync::Arc;

fn backend_for(connection: &ConnectionConfig, table: &str) -> Result<Arc<dyn IndexBackend>> {
    let node = connection.node_name(table);
    tracing::debug!(node = %node, backend = %connection.backend, "Opening index node");
    create_backend(connection, &node)
        .with_context(|| format!("cannot open the index node for table '{table}'"))
}

/// Remove every record document from the table's node.
pub async fn cmd_clear(connection: &ConnectionConfig, table: &str) -> Result<usize> {
    let backend = backend_for(connection, table)?;
    let removed = backend
        .clear()
        .await
        .with_context(|| format!("clearing the index of '{table}' failed"))?;
    tracing::info!(table, removed, "Index cleared");
    Ok(removed)
}

/// Search the table's node.
pub async fn cmd_search(
    connection: &ConnectionConfig,
    table: &str,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<IndexDocument>> {
    let backend = backend_for(connection, table)?;
    let condition = SearchCondition::build(query, options)?;
    let documents = backend
        .search(&condition)
        .await
        .with_context(|| format!("searching '{table}' failed"))?;
    Ok(documents)
}

/// Count matches on the table's node.
pub async fn cmd_count(
    connection: &ConnectionConfig,
    table: &str,
    query: &str,
    options: &SearchOptions,
) -> Result<usize> {
    let backend = backend_for(connection, table)?;
    let condition = SearchCondition::count_only(query, options)?;
    let count = backend
        .count(&condition)
        .await
        .with_context(|| format!("counting '{table}' failed"))?;
    Ok(count)
}

/// Render the resolved configuration with the password masked.
pub fn cmd_config(connection: &ConnectionConfig) -> Result<String> {
    Ok(connection.redacted().to_toml_string()?)
}

/// One line per document: record id and URI.
pub fn format_document(document: &IndexDocument) -> String {
    let id = document
        .db_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{id}\t{}", document.uri().unwrap_or("-"))
}

// ============================================================================
// Tests
// ============================================================================
