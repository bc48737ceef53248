//! Type-state IMAP client.
//!
//! A session starts as [`NotAuthenticated`] and becomes [`Authenticated`]
//! after LOGIN. Methods live on the state where the protocol allows them.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod states;

use std::fmt;
use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::states::{Authenticated, NotAuthenticated};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// An open IMAP session in protocol state `State`.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    _state: PhantomData<State>,
}

impl<S, State> fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            _state: PhantomData,
        }
    }

    /// Capabilities advertised so far. Empty right after STARTTLS.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Whether `cap` was advertised.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Whether STARTTLS was advertised.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.has_capability(&Capability::StartTls)
    }

    /// Whether the server refuses LOGIN on this connection.
    #[must_use]
    pub fn login_disabled(&self) -> bool {
        self.has_capability(&Capability::LoginDisabled)
    }

    /// Asks for the capability list and returns it.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        self.run(&Command::Capability).await?;
        Ok(self.capabilities.clone())
    }

    /// Sends `command` and reads up to its completion.
    ///
    /// A capability list seen on the way, as untagged data or a
    /// `[CAPABILITY ...]` code, replaces the stored one. Non-OK completions
    /// become [`Error::No`], [`Error::Bad`] or [`Error::Bye`].
    pub(crate) async fn run(&mut self, command: &Command) -> Result<Vec<Vec<u8>>> {
        let tag = self.tag_gen.next_tag();
        self.stream.send(&command.serialize(&tag)).await?;
        let frames = self.stream.read_exchange(&tag).await?;

        let mut completion = None;
        for frame in &frames {
            match ResponseParser::parse(frame) {
                Ok(Response::Untagged(untagged)) => {
                    if let Some(caps) = untagged.capabilities() {
                        self.capabilities = caps.to_vec();
                    }
                }
                Ok(Response::Tagged {
                    tag: got,
                    status,
                    code,
                    text,
                }) if got == tag => {
                    if let Some(ResponseCode::Capability(caps)) = code {
                        self.capabilities = caps;
                    }
                    completion = Some((status, text));
                }
                _ => {}
            }
        }

        match completion {
            Some((Status::Ok | Status::PreAuth, _)) => Ok(frames),
            Some((Status::No, text)) => Err(Error::No(text)),
            Some((Status::Bad, text)) => Err(Error::Bad(text)),
            Some((Status::Bye, text)) => Err(Error::Bye(text)),
            None => Err(Error::Protocol(format!("unreadable completion for {tag}"))),
        }
    }
}
