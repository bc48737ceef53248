//! Account management module.
//!
//! Provides the account model, the store abstraction and its `SQLite`
//! implementation.

pub mod credentials;
mod model;
mod repository;
mod store;

pub use credentials::{CredentialError, CredentialResult, Keyring};
pub use model::{AccountId, Credentials, DiscoveredAccount, NewAccount, OwnerId, Security};
pub use repository::{PasswordStorage, SqliteAccountStore};
pub use store::AccountStore;
