//! Record contract and per-model configuration.
//!
//! A host record type implements [`SearchableRecord`] and declares what to
//! index with a [`SearchableDeclaration`]. At setup time the declaration is
//! checked against the record's accessors and resolved into a [`ModelConfig`],
//! which is then shared by `Arc` between the coordinator and every record
//! instance of the type.
//!
//! # Example
//!
//! ```rust
//! use searchsync_fts::model::{ModelConfig, SearchableDeclaration};
//!
//! let declaration = SearchableDeclaration::default()
//!     .searchable_fields(["title", "body"])
//!     .attribute("title")
//!     .attribute_from("category", "category_name");
//!
//! let config = ModelConfig::resolve_with(
//!     "articles",
//!     &["id", "title", "body", "category_name", "created_at", "updated_at"],
//!     &declaration,
//! )
//! .unwrap();
//!
//! assert!(config.observed_fields().contains("category_name"));
//! assert!(config.observed_fields().contains("updated_at"));
//! assert!(config.attributes().iter().any(|a| a.name == "mdate"));
//! ```

use std::collections::BTreeMap;

use searchsync_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::tracker::{ChangeTracker, ObservedFields};
use crate::types::{FieldValue, RecordId};

/// Columns probed, in order, for the automatic `cdate` attribute.
pub const CREATED_COLUMNS: [&str; 2] = ["created_at", "created_on"];

/// Columns probed, in order, for the automatic `mdate` attribute.
pub const UPDATED_COLUMNS: [&str; 2] = ["updated_at", "updated_on"];

/// Attribute names the document builder writes itself.
const RESERVED_ATTRIBUTES: [&str; 3] = ["db_id", "uri", "type_base"];

/// A persisted entity whose rows are mirrored into the index.
pub trait SearchableRecord: Send + Sync {
    /// Change-tracking strategy of this record type.
    type Tracker: ChangeTracker;

    /// Relational table name; part of the node name.
    fn table_name() -> &'static str;

    /// Every accessor name [`field_value`](Self::field_value) answers,
    /// columns and computed values alike.
    fn field_names() -> &'static [&'static str];

    /// Record identity.
    fn id(&self) -> RecordId;

    /// Read a `db_id` attribute back into this type's id.
    ///
    /// The default treats anything that parses as an integer as an integer
    /// key. Types with string keys override it so that numeric-looking keys
    /// such as `"2024"` stay strings.
    fn parse_id(value: &str) -> RecordId {
        RecordId::parse(value)
    }

    /// Concrete type name, used in `@uri`.
    fn type_name(&self) -> &str;

    /// Root type of the inheritance hierarchy this record belongs to, if any.
    fn base_type_name(&self) -> Option<&str> {
        None
    }

    /// Read an accessor. Unknown names yield [`FieldValue::Null`].
    fn field_value(&self, field: &str) -> FieldValue;

    /// This instance's change tracker.
    fn tracker(&self) -> &Self::Tracker;

    /// Mutable access to this instance's change tracker.
    fn tracker_mut(&mut self) -> &mut Self::Tracker;
}

// ============================================================================
// Declaration
// ============================================================================

/// What a model type wants indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchableDeclaration {
    /// Fields indexed as full text, in order.
    #[serde(default = "default_searchable_fields")]
    pub searchable_fields: Vec<String>,

    /// Stored attributes: name → source accessor (same name when `None`).
    #[serde(default)]
    pub attributes: BTreeMap<String, Option<String>>,

    /// Extra fields whose change triggers a reindex.
    #[serde(default)]
    pub if_changed: Vec<String>,

    /// Do not add `cdate`/`mdate` automatically.
    #[serde(default)]
    pub ignore_timestamp: bool,

    /// Maintain the index from the save/create/destroy hooks.
    #[serde(default = "default_true")]
    pub auto_update: bool,
}

fn default_searchable_fields() -> Vec<String> {
    vec!["body".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for SearchableDeclaration {
    fn default() -> Self {
        Self {
            searchable_fields: default_searchable_fields(),
            attributes: BTreeMap::new(),
            if_changed: Vec::new(),
            ignore_timestamp: false,
            auto_update: true,
        }
    }
}

impl SearchableDeclaration {
    /// Replace the full-text fields.
    pub fn searchable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Store an attribute read from the accessor of the same name.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), None);
        self
    }

    /// Store an attribute read from another accessor.
    pub fn attribute_from(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), Some(source.into()));
        self
    }

    /// Add reindex trigger fields.
    pub fn if_changed<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.if_changed.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Skip the automatic `cdate`/`mdate` attributes.
    pub fn ignore_timestamp(mut self) -> Self {
        self.ignore_timestamp = true;
        self
    }

    /// Leave index maintenance to explicit calls.
    pub fn manual_update(mut self) -> Self {
        self.auto_update = false;
        self
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// A stored attribute after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttribute {
    /// Logical attribute name (before system-attribute mapping).
    pub name: String,
    /// Accessor the value is read from.
    pub source: String,
    /// Added automatically (timestamps) rather than declared.
    pub injected: bool,
}

/// Per-model-type configuration, built once at setup.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    table: String,
    searchable_fields: Vec<String>,
    attributes: Vec<StoredAttribute>,
    observed: ObservedFields,
    auto_update: bool,
}

impl ModelConfig {
    /// Resolve a declaration against a record type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the declaration names an accessor the
    /// record type does not have, or uses a reserved attribute name.
    pub fn resolve<R: SearchableRecord>(declaration: &SearchableDeclaration) -> Result<Self> {
        Self::resolve_with(R::table_name(), R::field_names(), declaration)
    }

    /// Resolve a declaration against an explicit table name and accessor list.
    pub fn resolve_with(
        table: &str,
        known_fields: &[&str],
        declaration: &SearchableDeclaration,
    ) -> Result<Self> {
        let knows = |field: &str| known_fields.contains(&field);
        let require = |field: &str, role: &str| -> Result<()> {
            if field.trim().is_empty() {
                return Err(Error::config(format!("{table}: blank {role} name")));
            }
            if !knows(field) {
                return Err(Error::config(format!(
                    "{table}: unknown {role} '{field}'"
                )));
            }
            Ok(())
        };

        for field in &declaration.searchable_fields {
            require(field.as_str(), "searchable field")?;
        }
        for field in &declaration.if_changed {
            require(field.as_str(), "if_changed field")?;
        }

        let mut attributes = Vec::with_capacity(declaration.attributes.len() + 2);
        for (name, source) in &declaration.attributes {
            if name.trim().is_empty() {
                return Err(Error::config(format!("{table}: blank attribute name")));
            }
            if RESERVED_ATTRIBUTES.contains(&name.as_str()) {
                return Err(Error::config(format!(
                    "{table}: attribute name '{name}' is reserved"
                )));
            }
            let source = source.clone().unwrap_or_else(|| name.clone());
            require(source.as_str(), "attribute source")?;
            attributes.push(StoredAttribute {
                name: name.clone(),
                source,
                injected: false,
            });
        }

        if !declaration.ignore_timestamp {
            for (name, columns) in [("cdate", CREATED_COLUMNS), ("mdate", UPDATED_COLUMNS)] {
                if declaration.attributes.contains_key(name) {
                    continue;
                }
                if let Some(column) = columns.iter().find(|&&c| knows(c)) {
                    attributes.push(StoredAttribute {
                        name: name.to_string(),
                        source: column.to_string(),
                        injected: true,
                    });
                }
            }
        }

        let observed = ObservedFields::new(
            declaration
                .searchable_fields
                .iter()
                .chain(attributes.iter().map(|a| &a.source))
                .chain(declaration.if_changed.iter())
                .cloned(),
        );

        log::debug!(
            "Resolved searchable model '{table}': {} text fields, {} attributes, {} observed",
            declaration.searchable_fields.len(),
            attributes.len(),
            observed.len()
        );

        Ok(Self {
            table: table.to_string(),
            searchable_fields: declaration.searchable_fields.clone(),
            attributes,
            observed,
            auto_update: declaration.auto_update,
        })
    }

    /// Relational table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Full-text fields in declared order.
    pub fn searchable_fields(&self) -> &[String] {
        &self.searchable_fields
    }

    /// Stored attributes, declared ones first, then injected timestamps.
    pub fn attributes(&self) -> &[StoredAttribute] {
        &self.attributes
    }

    /// Fields whose change triggers a reindex.
    pub fn observed_fields(&self) -> ObservedFields {
        self.observed.clone()
    }

    /// Whether lifecycle hooks maintain the index.
    pub fn auto_update(&self) -> bool {
        self.auto_update
    }
}

// ============================================================================
// Tests
// ============================================================================
