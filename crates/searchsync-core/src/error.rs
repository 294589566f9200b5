//! Error types for Searchsync.

/// Errors that can occur while keeping an index node in sync.
///
/// Soft-empty search results (no hits, node without documents yet) are not
/// errors and never surface through this type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or unknown option, unsupported backend, unknown field in a
    /// model declaration. Fatal at setup time.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// Network or authentication failure talking to the index node.
    #[error("Backend unavailable: {message}")]
    BackendUnavailable {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The node answered but refused a mutation.
    #[error("Backend error: {message}")]
    Backend {
        /// What the node rejected
        message: String,
    },

    /// The node answered with something that is not a valid response.
    #[error("Protocol error: {message}")]
    Protocol {
        /// What could not be decoded
        message: String,
    },

    /// Error reported by the host's record store.
    #[error("Record store error: {message}")]
    Store {
        /// Human-readable error message
        message: String,
    },

    /// I/O error (config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type alias for Searchsync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is worth retrying.
    ///
    /// Nothing in Searchsync retries on its own; this is a hint for
    /// operational tooling.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::BackendUnavailable { .. } => true,
            Error::Io(_) => true,
            Error::Store { .. } => true,
            Error::Config { .. } => false,
            Error::Backend { .. } => false,
            Error::Protocol { .. } => false,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new backend-unavailable error without a source.
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Error::BackendUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend-unavailable error with a source error.
    pub fn unavailable_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::BackendUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new backend error.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }

    /// Creates a new protocol error.
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Error::Protocol {
            message: message.into(),
        }
    }

    /// Creates a new record store error.
    pub fn store<S: Into<String>>(message: S) -> Self {
        Error::Store {
            message: message.into(),
        }
    }
}
