//! In-process index backend.
//!
//! [`MemoryBackend`] keeps documents in a `Vec` and evaluates conditions the
//! way a node does, close enough for tests and local development:
//!
//! - phrase: `[UVSET]` or empty matches everything; otherwise terms joined by
//!   `AND`, `OR` and `ANDNOT` are evaluated left to right, each term being a
//!   case-insensitive substring match over the text blocks;
//! - attribute expressions `name OP value` with `STREQ STRNE STRINC STRBW
//!   STREW NUMEQ NUMNE NUMGT NUMGE NUMLT NUMLE`, and `!OP` for negation; a
//!   bare `name` checks that the attribute is present;
//! - order `name STRA|STRD|NUMA|NUMD`; numeric comparison understands
//!   numbers and XML-schema date-times. Without an order, documents come back
//!   in insertion order.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use searchsync_core::{Error, Result};

use crate::backend::IndexBackend;
use crate::condition::{CATCH_ALL, SearchCondition, UNIVERSAL_PHRASE};
use crate::document::{INTERNAL_ID, IndexDocument};
use crate::types::RecordId;

#[derive(Debug, Default)]
struct Store {
    documents: Vec<IndexDocument>,
    next_id: u64,
}

/// Index node held in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    node: String,
    store: Mutex<Store>,
}

impl MemoryBackend {
    /// Create an empty node.
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            store: Mutex::new(Store::default()),
        }
    }

    /// Node name.
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    /// Returns `true` when the node holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all stored documents in insertion order.
    pub fn documents(&self) -> Vec<IndexDocument> {
        self.lock().documents.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn matching(&self, condition: &SearchCondition) -> Result<Vec<IndexDocument>> {
        let store = self.lock();
        let mut matched = Vec::new();
        for doc in &store.documents {
            if matches_condition(doc, condition)? {
                matched.push(doc.clone());
            }
        }
        if let Some(order) = condition.order.as_deref() {
            sort_documents(&mut matched, order);
        }
        Ok(matched)
    }

    fn remove_matching(&self, expression: &str) -> Result<usize> {
        let mut store = self.lock();
        let doomed = store
            .documents
            .iter()
            .map(|doc| matches_attribute(doc, expression))
            .collect::<Result<Vec<bool>>>()?;
        let before = store.documents.len();
        let mut flags = doomed.into_iter();
        store.documents.retain(|_| !flags.next().unwrap_or(false));
        Ok(before - store.documents.len())
    }
}

#[async_trait]
impl IndexBackend for MemoryBackend {
    async fn add(&self, document: &IndexDocument) -> Result<()> {
        let mut store = self.lock();
        if let Some(uri) = document.uri() {
            store.documents.retain(|d| d.uri() != Some(uri));
        }
        store.next_id += 1;
        let mut stored = document.clone();
        stored.set_attribute(INTERNAL_ID, store.next_id.to_string());
        log::debug!("[{}] add {:?}", self.node, stored.uri());
        store.documents.push(stored);
        Ok(())
    }

    async fn remove(&self, id: &RecordId) -> Result<()> {
        let removed = self.remove_matching(&id.db_id_condition())?;
        log::debug!("[{}] remove db_id={id}: {removed} document(s)", self.node);
        Ok(())
    }

    async fn search(&self, condition: &SearchCondition) -> Result<Vec<IndexDocument>> {
        if condition.is_count_only() {
            return Ok(Vec::new());
        }
        let matched = self.matching(condition)?;
        let page = matched.into_iter().skip(condition.skip);
        Ok(match condition.max {
            Some(max) if max >= 0 => page
                .take(usize::try_from(max).unwrap_or(usize::MAX))
                .collect(),
            _ => page.collect(),
        })
    }

    async fn count(&self, condition: &SearchCondition) -> Result<usize> {
        Ok(self.matching(condition)?.len())
    }

    async fn clear(&self) -> Result<usize> {
        let removed = self.remove_matching(CATCH_ALL)?;
        log::info!("[{}] cleared {removed} document(s)", self.node);
        Ok(removed)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Condition evaluation
// ============================================================================

fn matches_condition(doc: &IndexDocument, condition: &SearchCondition) -> Result<bool> {
    if !matches_phrase(doc, &condition.phrase) {
        return Ok(false);
    }
    for expression in &condition.attributes {
        if !matches_attribute(doc, expression)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_phrase(doc: &IndexDocument, phrase: &str) -> bool {
    let phrase = phrase.trim();
    if phrase.is_empty() || phrase == UNIVERSAL_PHRASE {
        return true;
    }

    let haystack: Vec<String> = doc.texts.iter().map(|t| t.to_lowercase()).collect();
    let contains = |term: &str| {
        let needle = term.to_lowercase();
        haystack.iter().any(|text| text.contains(&needle))
    };

    // Each segment is an operator and the words of the term that follows it.
    let mut segments: Vec<(&str, Vec<&str>)> = vec![("AND", Vec::new())];
    for word in phrase.split_whitespace() {
        match word {
            "AND" | "OR" | "ANDNOT" => segments.push((word, Vec::new())),
            _ => {
                if let Some((_, term)) = segments.last_mut() {
                    term.push(word);
                }
            }
        }
    }

    let mut result: Option<bool> = None;
    for (operator, term) in segments.iter().filter(|(_, term)| !term.is_empty()) {
        let hit = contains(&term.join(" "));
        result = Some(match (result, *operator) {
            (None, _) => hit,
            (Some(acc), "OR") => acc || hit,
            (Some(acc), "ANDNOT") => acc && !hit,
            (Some(acc), _) => acc && hit,
        });
    }

    result.unwrap_or(true)
}

fn matches_attribute(doc: &IndexDocument, expression: &str) -> Result<bool> {
    let mut parts = expression.trim().splitn(3, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let Some(operator) = parts.next().filter(|op| !op.is_empty()) else {
        return Ok(doc.attribute(name).is_some());
    };
    let expected = parts.next().unwrap_or_default().trim();

    let Some(actual) = doc.attribute(name) else {
        return Ok(false);
    };

    let (negate, operator) = match operator.strip_prefix('!') {
        Some(op) => (true, op),
        None => (false, operator),
    };

    let hit = match operator.to_ascii_uppercase().as_str() {
        "STREQ" => actual == expected,
        "STRNE" => actual != expected,
        "STRINC" => actual.contains(expected),
        "STRBW" => actual.starts_with(expected),
        "STREW" => actual.ends_with(expected),
        op @ ("NUMEQ" | "NUMNE" | "NUMGT" | "NUMGE" | "NUMLT" | "NUMLE") => {
            match (parse_number(actual), parse_number(expected)) {
                (Some(a), Some(b)) => match op {
                    "NUMEQ" => a == b,
                    "NUMNE" => a != b,
                    "NUMGT" => a > b,
                    "NUMGE" => a >= b,
                    "NUMLT" => a < b,
                    _ => a <= b,
                },
                _ => false,
            }
        }
        other => {
            return Err(Error::backend(format!(
                "unsupported attribute operator '{other}' in '{expression}'"
            )));
        }
    };

    Ok(hit != negate)
}

/// Numbers, XML-schema date-times and plain dates, as seconds for dates.
fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<f64>() {
        return Some(n);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.timestamp() as f64);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc().timestamp() as f64)
}

fn sort_documents(documents: &mut [IndexDocument], order: &str) {
    let mut parts = order.split_whitespace();
    let Some(name) = parts.next() else {
        return;
    };
    let kind = parts
        .next()
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "STRA".to_string());

    let numeric = kind.starts_with("NUM");
    let descending = kind.ends_with('D');

    documents.sort_by(|a, b| {
        let (a, b) = (a.attribute(name), b.attribute(name));
        let ordering = if numeric {
            let (a, b) = (a.and_then(parse_number), b.and_then(parse_number));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        } else {
            a.cmp(&b)
        };
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
