//! # mailprobe-core
//!
//! Discovery of working IMAP connection parameters.
//!
//! This crate provides:
//! - Provider routing by MX record (Google Apps out of the box)
//! - The ordered probe matrix of hosts, ports and security modes
//! - Live probing through `mailprobe-imap`
//! - The discovery search with sequential or bounded-concurrent probing
//! - Account storage (`SQLite`, passwords optionally in the system keyring)
//! - Settings loaded from `settings.json`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod discovery;
mod error;
pub mod settings;

pub use account::credentials;
pub use account::{
    AccountId, AccountStore, CredentialError, CredentialResult, Credentials, DiscoveredAccount,
    Keyring, NewAccount, OwnerId, PasswordStorage, Security, SqliteAccountStore,
};
pub use discovery::{
    Discovery, DiscoveryOutcome, DnsMxResolver, DomainClassifier, ImapProber, ProviderRule,
};
pub use error::{Error, Result, StoreError};
pub use settings::Settings;
