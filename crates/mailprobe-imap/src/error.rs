//! Failures while opening, authenticating or closing a session.

use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong talking to an IMAP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket-level failure, including failed TLS handshakes.
    #[error("network: {0}")]
    Io(#[from] std::io::Error),

    /// The host cannot be used as a TLS server name.
    #[error("host is not a valid TLS server name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A response line could not be parsed.
    #[error("unparseable response at byte {position}: {message}")]
    Parse {
        /// Offset into the line.
        position: usize,
        /// What was expected.
        message: String,
    },

    /// LOGIN was refused, or the credentials cannot be sent at all.
    #[error("login rejected: {0}")]
    Auth(String),

    /// Tagged NO.
    #[error("server said NO: {0}")]
    No(String),

    /// Tagged BAD.
    #[error("server said BAD: {0}")]
    Bad(String),

    /// The server is closing the connection.
    #[error("server said BYE: {0}")]
    Bye(String),

    /// A phase ran past its limit.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The command is not allowed in the current session state.
    #[error("not allowed now: {0}")]
    InvalidState(String),

    /// The server broke the protocol.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl Error {
    /// True when the endpoint answered but refused the credentials.
    #[must_use]
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::No(_))
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
