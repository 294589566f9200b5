//! Searchsync Core: errors and connection configuration.
//!
//! This crate holds the pieces every other Searchsync crate needs and has no
//! internal dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: Node connection settings and environment discovery

pub mod config;
pub mod error;

// Re-export key types at crate root for convenience
pub use config::{ConnectionConfig, environment};
pub use error::{Error, Result};
