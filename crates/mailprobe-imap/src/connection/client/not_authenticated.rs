//! Implementation for the not-authenticated state.

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator, is_quotable};
use crate::connection::framed::FramedStream;
use crate::connection::stream::ImapStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads the server greeting and initial capabilities. A BYE greeting is
    /// returned as [`Error::Bye`]; anything other than OK or PREAUTH is a
    /// protocol error.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_frame().await?;
        let Response::Untagged(untagged) = ResponseParser::parse(&greeting)? else {
            return Err(Error::Protocol("greeting must be untagged".to_string()));
        };

        let capabilities = match &untagged {
            UntaggedResponse::Bye { text, .. } => return Err(Error::Bye(text.clone())),
            UntaggedResponse::Ok { .. } | UntaggedResponse::PreAuth { .. } => {
                untagged.capabilities().map(<[_]>::to_vec).unwrap_or_default()
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        };

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            _state: PhantomData,
        })
    }

    /// Authenticates with the server using LOGIN.
    ///
    /// Consumes self and returns an authenticated client on success. A NO
    /// completion is reported as [`Error::Auth`]. Credentials containing CR,
    /// LF or NUL are refused before anything is written.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        if !is_quotable(username) || !is_quotable(password) {
            return Err(Error::Auth(
                "credentials contain characters LOGIN cannot carry".to_string(),
            ));
        }
        if self.login_disabled() {
            return Err(Error::InvalidState(
                "server advertises LOGINDISABLED".to_string(),
            ));
        }

        let cmd = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.run(&cmd).await {
            Ok(_) => {}
            Err(Error::No(text)) => return Err(Error::Auth(text)),
            Err(e) => return Err(e),
        }

        debug!(username, "LOGIN accepted");
        Ok(self.transition())
    }

    /// Gracefully disconnects from the server without authenticating.
    pub async fn logout(mut self) -> Result<()> {
        match self.run(&Command::Logout).await {
            Ok(_) | Err(Error::Bye(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Client<ImapStream, NotAuthenticated> {
    /// Upgrades the connection with STARTTLS.
    ///
    /// Capabilities learned before the upgrade are discarded, as RFC 3501
    /// requires; call [`Client::capability`] to refresh them.
    pub async fn starttls(mut self, host: &str) -> Result<Self> {
        self.run(&Command::StartTls).await?;

        if self.stream.has_buffered_data() {
            return Err(Error::Protocol(
                "data received after STARTTLS before the TLS handshake".to_string(),
            ));
        }

        let tls = self.stream.into_inner().secure(host).await?;
        debug!(host, "STARTTLS upgrade complete");

        Ok(Self {
            stream: FramedStream::new(tls),
            tag_gen: self.tag_gen,
            capabilities: Vec::new(),
            _state: PhantomData,
        })
    }
}
