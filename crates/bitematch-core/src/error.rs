//! Error types for bitematch-core

use thiserror::Error;

/// Result type alias using bitematch-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bitematch-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Candidate or match not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote document store error
    #[error("Remote store error: {0}")]
    Remote(#[from] crate::remote::RemoteError),

    /// Places search error
    #[error("Places error: {0}")]
    Places(#[from] crate::places::PlacesError),

    /// Authentication error
    #[error("Auth error: {0}")]
    Auth(#[from] crate::auth::AuthError),
}
