//! Index document representation and construction.
//!
//! An [`IndexDocument`] is what one record looks like inside the index:
//! ordered text blocks for full-text matching and a map of string attributes
//! for filtering and ordering. [`DocumentBuilder`] projects a
//! [`SearchableRecord`] into one, following its [`ModelConfig`].
//!
//! # Attributes written for every record
//!
//! | Attribute | Value |
//! |-----------|-------|
//! | `db_id` | record id, the join key back to the record store |
//! | `@uri` | `/{type}/{id}` |
//! | `type_base` | root type name, only for subtypes of a hierarchy |
//!
//! Stored attributes whose logical name is a node *system attribute*
//! (`title`, `mdate`, ...) are written with an `@` prefix so the node applies
//! its built-in semantics, e.g. numeric date ordering for `@mdate`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use searchsync_core::Result;
use serde::{Deserialize, Serialize};

use crate::model::{ModelConfig, SearchableRecord};
use crate::types::RecordId;

/// Join-key attribute.
pub const DB_ID: &str = "db_id";

/// Record URI attribute.
pub const URI: &str = "@uri";

/// Hierarchy root attribute.
pub const TYPE_BASE: &str = "type_base";

/// Backend-internal document id, present on search results only.
pub const INTERNAL_ID: &str = "@id";

/// Logical names the node reserves as `@`-prefixed system attributes.
pub const SYSTEM_ATTRIBUTES: [&str; 13] = [
    "uri", "digest", "cdate", "mdate", "adate", "title", "author", "type", "lang", "genre",
    "size", "weight", "misc",
];

/// Name under which a logical attribute is written into a document.
pub fn system_attribute_name(name: &str) -> Cow<'_, str> {
    if SYSTEM_ATTRIBUTES.contains(&name) {
        Cow::Owned(format!("@{name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// A document as stored in, or returned by, an index backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Text blocks, matched as full text.
    pub texts: Vec<String>,
    /// Attributes, name → value.
    pub attributes: BTreeMap<String, String>,
}

impl IndexDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text block.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.texts.push(text.into());
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Read an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Record id this document belongs to.
    pub fn db_id(&self) -> Option<RecordId> {
        self.attribute(DB_ID).map(RecordId::parse)
    }

    /// Record URI.
    pub fn uri(&self) -> Option<&str> {
        self.attribute(URI)
    }

    /// Backend-internal id, set on documents returned by a search.
    pub fn internal_id(&self) -> Option<&str> {
        self.attribute(INTERNAL_ID)
    }
}

/// Builds [`IndexDocument`]s for one model type.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    config: Arc<ModelConfig>,
}

impl DocumentBuilder {
    /// Create a builder for the given model configuration.
    pub fn new(config: Arc<ModelConfig>) -> Self {
        Self { config }
    }

    /// Project a record into a document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](searchsync_core::Error::Config) when the
    /// record id cannot be written as an
    /// attribute (see [`RecordId::check_indexable`]).
    pub fn build<R: SearchableRecord>(&self, record: &R) -> Result<IndexDocument> {
        let id = record.id();
        id.check_indexable()?;

        let mut doc = IndexDocument::new();

        for field in self.config.searchable_fields() {
            doc.add_text(record.field_value(field).to_index_string());
        }

        for attribute in self.config.attributes() {
            let value = record.field_value(&attribute.source);
            doc.set_attribute(
                system_attribute_name(&attribute.name),
                value.to_index_string(),
            );
        }

        let type_name = record.type_name();
        if let Some(base) = record.base_type_name() {
            if base != type_name {
                doc.set_attribute(TYPE_BASE, base);
            }
        }
        doc.set_attribute(URI, format!("/{type_name}/{id}"));
        doc.set_attribute(DB_ID, id.to_string());

        Ok(doc)
    }
}

// ============================================================================
// Tests
// ============================================================================
