//! Byte transport underneath the IMAP framing: TCP, optionally wrapped in TLS.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::{Error, Result};

/// A connected socket, either cleartext or TLS.
pub enum ImapStream {
    /// Cleartext TCP.
    Plain(TcpStream),
    /// TLS over TCP.
    Tls(Box<TlsStream<TcpStream>>),
}

impl ImapStream {
    /// Opens a cleartext TCP connection.
    pub async fn open_plain(host: &str, port: u16) -> Result<Self> {
        Ok(Self::Plain(TcpStream::connect((host, port)).await?))
    }

    /// Opens a TCP connection and completes the TLS handshake on it.
    pub async fn open_tls(host: &str, port: u16) -> Result<Self> {
        Self::open_plain(host, port).await?.secure(host).await
    }

    /// Runs the TLS handshake over a cleartext stream, verifying `host`.
    ///
    /// Used after STARTTLS and by [`ImapStream::open_tls`].
    pub async fn secure(self, host: &str) -> Result<Self> {
        let Self::Plain(tcp) = self else {
            return Err(Error::InvalidState("stream is already encrypted".to_string()));
        };
        let name = ServerName::try_from(host.to_string())?;
        let tls = tls_connector().connect(name, tcp).await?;
        debug!(host, "TLS established");
        Ok(Self::Tls(Box::new(tls)))
    }
}

/// TLS connector trusting the webpki roots, built on first use.
pub fn tls_connector() -> TlsConnector {
    static CONNECTOR: OnceLock<TlsConnector> = OnceLock::new();
    CONNECTOR
        .get_or_init(|| {
            let roots = rustls::RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            let config = rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
            TlsConnector::from(Arc::new(config))
        })
        .clone()
}

macro_rules! forward {
    ($this:expr, $s:ident => $call:expr) => {
        match $this.get_mut() {
            ImapStream::Plain($s) => $call,
            ImapStream::Tls($s) => $call,
        }
    };
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        forward!(self, s => Pin::new(s).poll_read(cx, buf))
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        forward!(self, s => Pin::new(s).poll_write(cx, buf))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        forward!(self, s => Pin::new(s).poll_flush(cx))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        forward!(self, s => Pin::new(s).poll_shutdown(cx))
    }
}
