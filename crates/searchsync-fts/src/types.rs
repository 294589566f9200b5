//! Value types shared by records, documents and backends.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use searchsync_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Identity of a persisted record.
///
/// Written into every document as the `db_id` attribute and used to join
/// search results back to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer primary key.
    Int(i64),
    /// String primary key (UUIDs, slugs).
    Str(String),
}

impl RecordId {
    /// Parse a `db_id` attribute value; integers win when the text parses as one.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Str(trimmed.to_string()),
        }
    }

    /// Check that the id survives the trip through attribute text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a string id that is blank or contains
    /// whitespace or control characters; attribute expressions are split on
    /// whitespace, so such an id could never be matched again.
    pub fn check_indexable(&self) -> Result<()> {
        match self {
            RecordId::Int(_) => Ok(()),
            RecordId::Str(s) if s.is_empty() => {
                Err(Error::config("record id is blank and cannot be indexed"))
            }
            RecordId::Str(s) if s.chars().any(|c| c.is_whitespace() || c.is_control()) => Err(
                Error::config(format!("record id '{s}' contains whitespace and cannot be indexed")),
            ),
            RecordId::Str(_) => Ok(()),
        }
    }

    /// Attribute expression selecting the document that belongs to this id.
    pub fn db_id_condition(&self) -> String {
        match self {
            RecordId::Int(n) => format!("db_id NUMEQ {n}"),
            RecordId::Str(s) => format!("db_id STREQ {s}"),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        RecordId::Int(i64::from(id))
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Str(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Str(id)
    }
}

/// A value read from a record accessor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Missing or SQL NULL; indexes as an empty string.
    #[default]
    Null,
    /// Text column.
    Text(String),
    /// Integer column.
    Integer(i64),
    /// Floating point column.
    Float(f64),
    /// Boolean column.
    Bool(bool),
    /// Date column.
    Date(NaiveDate),
    /// Date-time column.
    Timestamp(DateTime<FixedOffset>),
}

impl FieldValue {
    /// Returns `true` for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// String form written into the index.
    ///
    /// Date-times use the XML-schema format (`2008-09-17T00:00:00+00:00`)
    /// the node parses for its `@cdate`/`@mdate` ordering.
    pub fn to_index_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Float(x) => x.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_index_string())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value.fixed_offset())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

// ============================================================================
// Tests
// ============================================================================
