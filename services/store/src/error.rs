//! services/store/src/error.rs
//!
//! Defines the primary error type for the store service.

use crate::config::ConfigError;
use jobboard_core::ports::SchemaError;

/// The primary error type for the `store` service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the schema port.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Represents an error from the underlying database library.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
