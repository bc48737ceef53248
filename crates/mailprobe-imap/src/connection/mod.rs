//! Opening a session: transport, framing, and the type-state client.

mod client;
mod config;
mod framed;
mod stream;

use std::future::Future;
use std::time::Duration;

use tracing::debug;

pub use client::{Authenticated, Client, NotAuthenticated};
pub use config::{Config, Security, Timeouts};
pub use framed::FramedStream;
pub use stream::{ImapStream, tls_connector};

use crate::{Error, Result};

/// Connects to the server described by `config` and reads its greeting.
///
/// For [`Security::StartTls`] the connection is upgraded before returning;
/// a server that does not offer STARTTLS is an error rather than a silent
/// fallback to plaintext.
///
/// # Errors
///
/// Returns [`Error::Timeout`] if connecting or a protocol exchange takes
/// longer than the configured limits, and the underlying failure otherwise.
pub async fn connect(config: &Config) -> Result<Client<ImapStream, NotAuthenticated>> {
    let host = config.host.as_str();
    debug!(host, port = config.port, security = %config.security, "connecting");

    let limits = config.timeouts;
    if !config.security.protects_login() {
        debug!(host, port = config.port, "credentials will be sent in cleartext");
    }

    let stream = if config.security == Security::Implicit {
        with_timeout(limits.connect, ImapStream::open_tls(host, config.port)).await?
    } else {
        with_timeout(limits.connect, ImapStream::open_plain(host, config.port)).await?
    };

    let mut client = with_timeout(limits.exchange, Client::from_stream(stream)).await?;

    if config.security == Security::StartTls {
        if client.capabilities().is_empty() {
            with_timeout(limits.exchange, client.capability()).await?;
        }
        if !client.supports_starttls() {
            return Err(Error::Protocol("server does not offer STARTTLS".to_string()));
        }
        client = with_timeout(limits.exchange, client.starttls(host)).await?;
    }

    Ok(client)
}

async fn with_timeout<T>(limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout(limit))?
}
