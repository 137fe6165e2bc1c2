//! Unified error types and result handling.
//!
//! Query-level failures abort an aggregation and surface as [`Error::FetchFailed`].
//! Record-level problems never become an `Error`; they are reported as
//! [`crate::core::records::MalformedRecord`] diagnostics instead.

use crate::gateway::Collection;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Direct database access failed (connection, table creation)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    #[allow(missing_docs)]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    #[allow(missing_docs)]
    EnvVar(#[from] std::env::VarError),

    /// A period could not be built from the given bounds or month string
    #[error("Invalid period: {message}")]
    InvalidPeriod {
        /// Why the period was rejected
        message: String,
    },

    /// The remote gateway rejected or failed a query
    #[error("Failed to fetch `{collection}`: {message}")]
    FetchFailed {
        /// Collection whose query failed first
        collection: Collection,
        /// Message reported by the gateway
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
