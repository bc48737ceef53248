//! Error types for the core library.

use thiserror::Error;

use crate::account::OwnerId;
use crate::account::credentials::CredentialError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The email address cannot be split into a local part and a domain.
    #[error("Invalid email address: {0:?}")]
    InvalidAddress(String),

    /// Persisting or loading accounts failed.
    #[error("Account store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by an account store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Credential storage error.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The owner has no stored accounts.
    #[error("No accounts stored for owner {0}")]
    NotFound(OwnerId),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
