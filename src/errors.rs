//! Unified error type for the POS backend and the migration tooling.
//!
//! Fetch-phase failures surface as [`Error::Source`] or [`Error::Http`] and are
//! meant to abort a migration run. Everything raised while writing a single
//! record is caught by the orchestrator and turned into a per-record outcome.

use thiserror::Error;

/// All errors produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration (files, flags, page sizes)
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// Request payload rejected before touching the database
    #[error("Validation error: {message}")]
    Validation {
        /// Which field failed and why
        message: String,
    },

    /// The content API answered, but not with usable data
    #[error("Source API error: {message}")]
    Source {
        /// GraphQL error messages or a description of the bad response
        message: String,
    },

    /// Transport-level failure talking to the content API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any failure reported by the destination database
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// No product matched the given key
    #[error("Product not found: {key}")]
    ProductNotFound {
        /// Slug or id that was looked up
        key: String,
    },

    /// Money amount that is negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A required environment variable is missing
    #[error("Environment variable {name} error: {source}")]
    EnvVar {
        /// Name of the variable
        name: String,
        /// Underlying lookup error
        source: std::env::VarError,
    },

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
