//! Connection settings for the index node.
//!
//! [`ConnectionConfig`] is read from a TOML file (unknown keys are rejected)
//! and then overridden from `SEARCHSYNC_*` environment variables. Every key
//! has a default, so an empty file, or no file at all, yields a usable
//! configuration pointing at `http://localhost:1978`.
//!
//! ```toml
//! host = "search.internal"
//! port = 1978
//! user = "admin"
//! password = "admin"
//! node_prefix = "production"
//! backend = "estraier"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming the deployment environment.
pub const ENV_VAR: &str = "SEARCHSYNC_ENV";

/// Environment name used when [`ENV_VAR`] is unset.
pub const DEFAULT_ENVIRONMENT: &str = "development";

const MASK: &str = "********";

/// Connection and backend selection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Node server host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Node server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Basic-auth user.
    #[serde(default = "default_user")]
    pub user: String,

    /// Basic-auth password.
    #[serde(default = "default_password")]
    pub password: String,

    /// Explicit node name; overrides `{node_prefix}_{table}` entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    /// Node name prefix; the environment name when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_prefix: Option<String>,

    /// Backend type: "estraier" (alias "http") or "memory".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1978
}

fn default_user() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin".to_string()
}

fn default_backend() -> String {
    "estraier".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_timeout() -> u64 {
    30
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
            node: None,
            node_prefix: None,
            backend: default_backend(),
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ConnectionConfig {
    /// Load the configuration from an optional TOML file, then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Config`] when it cannot be parsed or an override is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with overrides read through `lookup` instead of
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                log::debug!("Loaded connection config from {}", path.display());
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Invalid connection config: {e}")))
    }

    /// Apply `SEARCHSYNC_*` overrides obtained through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SEARCHSYNC_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SEARCHSYNC_PORT") {
            self.port = port
                .parse()
                .map_err(|_| Error::config(format!("SEARCHSYNC_PORT is not a port: '{port}'")))?;
        }
        if let Some(user) = lookup("SEARCHSYNC_USER") {
            self.user = user;
        }
        if let Some(password) = lookup("SEARCHSYNC_PASSWORD") {
            self.password = password;
        }
        if let Some(node) = lookup("SEARCHSYNC_NODE") {
            self.node = Some(node);
        }
        if let Some(prefix) = lookup("SEARCHSYNC_NODE_PREFIX") {
            self.node_prefix = Some(prefix);
        }
        if let Some(backend) = lookup("SEARCHSYNC_BACKEND") {
            self.backend = backend;
        }
        Ok(())
    }

    /// Name of the node holding documents for `table`.
    ///
    /// An explicit `node` wins; otherwise `{prefix}_{table}` with the prefix
    /// falling back to the environment name.
    pub fn node_name(&self, table: &str) -> String {
        if let Some(node) = self.node.as_deref().filter(|n| !n.trim().is_empty()) {
            return node.to_string();
        }
        let prefix = self.node_prefix.clone().unwrap_or_else(environment);
        format!("{prefix}_{table}")
    }

    /// Base URL of a node: `http://{host}:{port}/node/{name}`.
    pub fn node_url(&self, node_name: &str) -> String {
        format!("http://{}:{}/node/{}", self.host, self.port, node_name)
    }

    /// Copy of this configuration with the password masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            password: MASK.to_string(),
            ..self.clone()
        }
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

/// Current environment name (`SEARCHSYNC_ENV`, default `development`).
pub fn environment() -> String {
    std::env::var(ENV_VAR)
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

// ============================================================================
// Tests
// ============================================================================
