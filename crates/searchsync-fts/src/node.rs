//! HTTP backend for a remote index node.
//!
//! Speaks the node protocol at `http://{host}:{port}/node/{name}`:
//!
//! | Call | Request |
//! |------|---------|
//! | add | `POST put_doc`, draft body |
//! | remove | `POST search` for the `db_id`, then `POST out_doc` per match |
//! | search, count | `POST search`, form encoded |
//! | clear | `POST search` with the catch-all condition, then `POST out_doc` per match |
//!
//! Every request carries basic authentication.
//!
//! # Status handling
//!
//! - transport failures, `401`/`403` and `5xx` → [`Error::BackendUnavailable`]
//! - other failures on `search` → empty result, logged as a warning (a node
//!   that does not exist yet answers `404`)
//! - other failures on `put_doc`/`out_doc` → [`Error::Backend`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use searchsync_core::{ConnectionConfig, Error, Result};

use crate::backend::IndexBackend;
use crate::condition::{COUNT_ONLY_MAX, SearchCondition, UNIVERSAL_PHRASE};
use crate::document::IndexDocument;
use crate::draft::{DRAFT_CONTENT_TYPE, SearchResponse, decode_search, encode_document};
use crate::types::RecordId;

/// Client for one remote node.
pub struct NodeBackend {
    client: Client,
    node: String,
    url: String,
    user: String,
    password: String,
}

impl NodeBackend {
    /// Create a client for `node` using the connection settings.
    ///
    /// No request is made until the first call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(config: &ConnectionConfig, node: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            node: node.to_string(),
            url: config.node_url(node),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL of the node.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{action}", self.url)
    }

    /// Send a request, mapping unreachable or unauthorized nodes to errors.
    async fn send(&self, action: &str, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = request
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|e| {
                Error::unavailable_with_source(
                    format!("{action} on node '{}' failed: {e}", self.node),
                    e,
                )
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::unavailable(format!(
                "node '{}' rejected the credentials for user '{}' (HTTP {status})",
                self.node, self.user
            )));
        }
        if status.is_server_error() {
            return Err(Error::unavailable(format!(
                "{action} on node '{}' failed (HTTP {status})",
                self.node
            )));
        }

        let body = response.text().await.map_err(|e| {
            Error::unavailable_with_source(
                format!("reading {action} response from node '{}' failed", self.node),
                e,
            )
        })?;
        Ok((status, body))
    }

    async fn mutate(&self, action: &str, request: RequestBuilder) -> Result<()> {
        let (status, body) = self.send(action, request).await?;
        if !status.is_success() {
            return Err(Error::backend(format!(
                "{action} on node '{}' failed (HTTP {status}): {}",
                self.node,
                body.trim()
            )));
        }
        Ok(())
    }

    /// Run a search; `None` when the node answered with a soft failure.
    async fn query(
        &self,
        condition: &SearchCondition,
        count_only: bool,
    ) -> Result<Option<SearchResponse>> {
        let form = search_form(condition, count_only);
        log::debug!("[{}] search {form:?}", self.node);
        let request = self.client.post(self.endpoint("search")).form(&form);
        let (status, body) = self.send("search", request).await?;
        if !status.is_success() {
            log::warn!(
                "search on node '{}' returned HTTP {status}; treating as no results",
                self.node
            );
            return Ok(None);
        }
        decode_search(&body).map(Some)
    }

    async fn out_doc(&self, internal_id: &str) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint("out_doc"))
            .form(&[("id", internal_id)]);
        self.mutate("out_doc", request).await
    }

    /// Delete every document matching `condition`; returns how many.
    async fn remove_matching(&self, condition: &SearchCondition) -> Result<usize> {
        let Some(response) = self.query(condition, false).await? else {
            return Ok(0);
        };
        let mut removed = 0;
        for document in &response.documents {
            if let Some(id) = document.internal_id() {
                self.out_doc(id).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Form fields of a search request.
fn search_form(condition: &SearchCondition, count_only: bool) -> Vec<(String, String)> {
    let mut form = Vec::new();

    if condition.is_universal() {
        form.push(("phrase".to_string(), UNIVERSAL_PHRASE.to_string()));
    } else if !condition.phrase.trim().is_empty() {
        form.push(("phrase".to_string(), condition.phrase.clone()));
    }

    for (i, expression) in condition.attributes.iter().enumerate() {
        form.push((format!("attr{}", i + 1), expression.clone()));
    }

    if let Some(order) = &condition.order {
        form.push(("order".to_string(), order.clone()));
    }

    let max = match condition.max {
        _ if count_only => 0,
        Some(COUNT_ONLY_MAX) => 0,
        Some(max) => max,
        None => -1,
    };
    form.push(("max".to_string(), max.to_string()));
    form.push(("skip".to_string(), condition.skip.to_string()));
    form.push(("wwidth".to_string(), "0".to_string()));

    form
}

#[async_trait]
impl IndexBackend for NodeBackend {
    async fn add(&self, document: &IndexDocument) -> Result<()> {
        log::debug!("[{}] put_doc {:?}", self.node, document.uri());
        let request = self
            .client
            .post(self.endpoint("put_doc"))
            .header(CONTENT_TYPE, DRAFT_CONTENT_TYPE)
            .body(encode_document(document));
        self.mutate("put_doc", request).await
    }

    async fn remove(&self, id: &RecordId) -> Result<()> {
        let removed = self
            .remove_matching(&SearchCondition::for_record(id))
            .await?;
        log::debug!("[{}] remove db_id={id}: {removed} document(s)", self.node);
        Ok(())
    }

    async fn search(&self, condition: &SearchCondition) -> Result<Vec<IndexDocument>> {
        if condition.is_count_only() {
            return Ok(Vec::new());
        }
        Ok(self
            .query(condition, false)
            .await?
            .map(|response| response.documents)
            .unwrap_or_default())
    }

    async fn count(&self, condition: &SearchCondition) -> Result<usize> {
        Ok(self
            .query(condition, true)
            .await?
            .map(|response| response.hits)
            .unwrap_or(0))
    }

    async fn clear(&self) -> Result<usize> {
        let removed = self.remove_matching(&SearchCondition::catch_all()).await?;
        log::info!("[{}] cleared {removed} document(s)", self.node);
        Ok(removed)
    }

    fn name(&self) -> &str {
        "estraier"
    }
}

impl std::fmt::Debug for NodeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeBackend")
            .field("node", &self.node)
            .field("url", &self.url)
            .field("user", &self.user)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
