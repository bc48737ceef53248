//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::Authenticated;
use crate::command::Command;
use crate::{Error, Result};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Logs out and shuts the connection down.
    ///
    /// The server usually sends an untagged BYE before completing LOGOUT;
    /// that is treated as success.
    pub async fn logout(mut self) -> Result<()> {
        match self.run(&Command::Logout).await {
            Ok(_) | Err(Error::Bye(_)) => {}
            Err(e) => return Err(e),
        }
        // The server may already have closed its side.
        let _ = self.stream.shutdown().await;
        Ok(())
    }
}
