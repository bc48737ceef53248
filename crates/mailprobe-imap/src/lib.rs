//! # mailprobe-imap
//!
//! A small IMAP client that does exactly what connection discovery needs:
//! open a connection in one of three security modes, read the greeting,
//! authenticate with LOGIN and log out again.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailprobe_imap::{Config, Security, connect};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> mailprobe_imap::Result<()> {
//!     let config = Config::new("imap.example.com", 143, Security::StartTls)
//!         .with_timeout(Duration::from_secs(2));
//!
//!     let client = connect(&config).await?;
//!     let client = client.login("user@example.com", "password").await?;
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! The client uses the type-state pattern so that only valid commands can be
//! issued in each protocol state:
//!
//! ```text
//! ┌─────────────────────┐
//! │   NotAuthenticated  │ ─── login() ───→ Authenticated ─── logout()
//! └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: IMAP command builders and tag generation
//! - [`connection`]: Connection setup, framing and the type-state client
//! - [`parser`]: Status-response parser
//! - [`types`]: Capabilities, response codes and statuses

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, FramedStream, ImapStream, NotAuthenticated, Security, Timeouts,
    connect,
};
pub use error::{Error, Result};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use types::{Capability, ResponseCode, Status};
