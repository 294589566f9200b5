//! Node wire formats.
//!
//! Documents travel to the node as *draft* text:
//!
//! ```text
//! @uri=/Article/1
//! db_id=1
//!
//! Ruby
//! vim and emacs
//! ```
//!
//! Search results come back as border-separated sections. The first section
//! is a `KEY\tVALUE` meta block; each following one is a document (attribute
//! lines, a blank line, snippet lines). The last border carries `:END`.

use std::collections::BTreeMap;

use searchsync_core::{Error, Result};

use crate::document::{INTERNAL_ID, IndexDocument};

/// Content type of a draft request body.
pub const DRAFT_CONTENT_TYPE: &str = "text/x-estraier-draft";

/// Suffix marking the final border of a search response.
const END_MARKER: &str = ":END";

/// Meta key holding the total number of matches.
const HIT_KEY: &str = "HIT";

/// Render a document as draft text.
///
/// Newlines and tabs inside values are flattened to spaces; the
/// backend-internal id is never sent.
pub fn encode_document(document: &IndexDocument) -> String {
    let mut draft = String::new();
    for (name, value) in &document.attributes {
        if name == INTERNAL_ID {
            continue;
        }
        draft.push_str(&flatten(name));
        draft.push('=');
        draft.push_str(&flatten(value));
        draft.push('\n');
    }
    draft.push('\n');
    for text in &document.texts {
        draft.push_str(&flatten(text));
        draft.push('\n');
    }
    draft
}

fn flatten(value: &str) -> String {
    value.replace(['\r', '\n', '\t'], " ")
}

/// A decoded search response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    /// Total number of matches on the node (not just this page).
    pub hits: usize,
    /// Meta values other than `HIT` (`DOCNUM`, `TIME`, hints, ...).
    pub meta: BTreeMap<String, String>,
    /// Returned documents; text blocks hold the snippet lines.
    pub documents: Vec<IndexDocument>,
}

/// Decode a search response body.
///
/// An empty body is an empty response.
///
/// # Errors
///
/// Returns [`Error::Protocol`] when the body is truncated (no `:END` border)
/// or the `HIT` value is not a number.
pub fn decode_search(body: &str) -> Result<SearchResponse> {
    let mut lines = body.lines().skip_while(|l| l.trim().is_empty());
    let Some(border) = lines.next().map(str::trim_end) else {
        return Ok(SearchResponse::default());
    };
    let end_border = format!("{border}{END_MARKER}");

    let mut sections: Vec<Vec<&str>> = vec![Vec::new()];
    let mut finished = false;
    for line in lines {
        let trimmed = line.trim_end_matches('\r');
        if trimmed == end_border {
            finished = true;
            break;
        }
        if trimmed == border {
            sections.push(Vec::new());
        } else if let Some(section) = sections.last_mut() {
            section.push(trimmed);
        }
    }
    if !finished {
        return Err(Error::protocol("search response is missing its end border"));
    }

    let mut response = SearchResponse::default();
    let mut sections = sections.into_iter();
    let mut hits = None;
    for line in sections.next().unwrap_or_default() {
        let Some((key, value)) = line.split_once('\t') else {
            continue;
        };
        if key == HIT_KEY {
            let count = value.trim().parse::<usize>().map_err(|_| {
                Error::protocol(format!("search response has a bad HIT value '{value}'"))
            })?;
            hits = Some(count);
        } else {
            response.meta.insert(key.to_string(), value.to_string());
        }
    }

    response.documents = sections.map(|section| decode_result(&section)).collect();
    response.hits = hits.unwrap_or(response.documents.len());
    Ok(response)
}

fn decode_result(lines: &[&str]) -> IndexDocument {
    let mut document = IndexDocument::new();
    let mut in_body = false;
    for line in lines {
        if in_body {
            // Snippet lines are `text` or `text\thighlighted-form`.
            let text = line.split('\t').next().unwrap_or_default();
            document.add_text(text);
            continue;
        }
        if line.is_empty() {
            in_body = true;
            continue;
        }
        // `%VECTOR` and other control lines carry no attributes.
        if line.starts_with('%') {
            continue;
        }
        if let Some((name, value)) = line.split_once('=') {
            document.set_attribute(name, value);
        }
    }
    document
}

// ============================================================================
// Tests
// ============================================================================
