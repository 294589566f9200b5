//! Search options and backend search conditions.
//!
//! Callers describe a search with [`SearchOptions`] (limit, offset, order,
//! attribute filters, result mode). [`SearchCondition::build`] combines the
//! options with a tokenized query into the backend-neutral condition every
//! [`IndexBackend`](crate::backend::IndexBackend) understands.
//!
//! # Order shorthand
//!
//! | Written | Sent |
//! |---------|------|
//! | `updated_at`, `updated_on` | `@mdate NUMD` |
//! | `created_at`, `created_on` | `@cdate NUMD` |
//! | `id` | `db_id NUMD` |
//!
//! A trailing `ASC` or `DESC` (any case) picks the direction; descending is
//! the default. Anything else is passed through unchanged.

use std::sync::LazyLock;

use regex::Regex;
use searchsync_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::query::tokenize;

/// Default number of results per search.
pub const DEFAULT_MAX: i64 = 100;

/// `max` sentinel: return the cardinality only, no documents.
pub const COUNT_ONLY_MAX: i64 = -1;

/// Phrase matching every document on the node.
pub const UNIVERSAL_PHRASE: &str = "[UVSET]";

/// Attribute expression matching every record-backed document.
pub const CATCH_ALL: &str = "@uri STRBW /";

#[allow(clippy::expect_used)]
static ORDER_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(updated_at|updated_on|created_at|created_on|id)(?:\s+(asc|desc))?$")
        .expect("order shorthand regex must compile")
});

// ============================================================================
// Options
// ============================================================================

/// Caller-facing search options.
///
/// Deserialization is strict: an unknown key is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchOptions {
    /// Maximum number of results.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Number of leading results to skip.
    #[serde(default)]
    pub offset: usize,

    /// Order expression or shorthand; relevance when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    /// Attribute filters (`attr OP value`). Accepts one string or a list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub attributes: Vec<String>,

    /// Return the matching index documents instead of records.
    #[serde(default)]
    pub raw_matches: bool,

    /// Return the number of matches only.
    #[serde(default)]
    pub count: bool,
}

fn default_limit() -> usize {
    DEFAULT_MAX as usize
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            order: None,
            attributes: Vec::new(),
            raw_matches: false,
            count: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

impl SearchOptions {
    /// Parse options from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed JSON, an unknown key, or
    /// conflicting modes.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid search options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Check that the options are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when both `raw_matches` and `count` are set.
    pub fn validate(&self) -> Result<()> {
        if self.raw_matches && self.count {
            return Err(Error::config(
                "search options: raw_matches and count are mutually exclusive",
            ));
        }
        Ok(())
    }

    /// Attribute filters with blank entries removed.
    pub fn attribute_filters(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
    }
}

// ============================================================================
// Condition
// ============================================================================

/// Backend-neutral search condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCondition {
    /// Boolean phrase; empty matches everything.
    pub phrase: String,

    /// Attribute expressions, all of which must hold.
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Result cap. `None` is unlimited; [`COUNT_ONLY_MAX`] asks for the
    /// cardinality only.
    pub max: Option<i64>,

    /// Number of leading matches to skip.
    #[serde(default)]
    pub skip: usize,

    /// Order expression; relevance when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl Default for SearchCondition {
    fn default() -> Self {
        Self {
            phrase: String::new(),
            attributes: Vec::new(),
            max: Some(DEFAULT_MAX),
            skip: 0,
            order: None,
        }
    }
}

impl SearchCondition {
    /// Build a condition from a raw query and options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the options are inconsistent.
    pub fn build(query: &str, options: &SearchOptions) -> Result<Self> {
        options.validate()?;

        let max = if options.count {
            COUNT_ONLY_MAX
        } else {
            i64::try_from(options.limit).unwrap_or(i64::MAX)
        };

        let condition = Self {
            phrase: tokenize(query),
            attributes: options.attribute_filters().map(str::to_string).collect(),
            max: Some(max),
            skip: options.offset,
            order: options
                .order
                .as_deref()
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(translate_order),
        };
        log::debug!("Built search condition: {condition:?}");
        Ok(condition)
    }

    /// Count-only variant of [`build`](Self::build); ignores `limit` and
    /// `offset`.
    pub fn count_only(query: &str, options: &SearchOptions) -> Result<Self> {
        let options = SearchOptions {
            count: true,
            raw_matches: false,
            offset: 0,
            ..options.clone()
        };
        Self::build(query, &options)
    }

    /// Unlimited condition selecting every record-backed document.
    pub fn catch_all() -> Self {
        Self {
            attributes: vec![CATCH_ALL.to_string()],
            max: None,
            ..Self::default()
        }
    }

    /// Condition selecting the document of one record.
    pub fn for_record(id: &crate::types::RecordId) -> Self {
        Self {
            attributes: vec![id.db_id_condition()],
            max: None,
            ..Self::default()
        }
    }

    /// Whether only the cardinality is requested.
    pub fn is_count_only(&self) -> bool {
        self.max == Some(COUNT_ONLY_MAX)
    }

    /// Whether the phrase and filters select every document.
    pub fn is_universal(&self) -> bool {
        self.phrase.trim().is_empty() && self.attributes.is_empty()
    }
}

/// Expand order shorthand into a node order expression.
pub fn translate_order(order: &str) -> String {
    let Some(caps) = ORDER_SHORTHAND.captures(order.trim()) else {
        return order.to_string();
    };

    let column = caps
        .get(1)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let ascending = caps
        .get(2)
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("asc"));

    let attribute = match column.as_str() {
        "updated_at" | "updated_on" => "@mdate",
        "created_at" | "created_on" => "@cdate",
        _ => "db_id",
    };
    let direction = if ascending { "NUMA" } else { "NUMD" };
    format!("{attribute} {direction}")
}

// ============================================================================
// Tests
// ============================================================================
