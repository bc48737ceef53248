//! Account passwords in the platform keyring (Secret Service, Keychain,
//! Credential Manager).

use keyring::Entry;
use tracing::debug;

use super::AccountId;

/// Keyring service the entries are filed under.
pub const SERVICE: &str = "mailprobe";

/// Failure talking to the keyring.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The platform keyring refused or is unavailable.
    #[error("keyring: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result alias for keyring access.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Handle on the IMAP passwords of stored accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyring {
    service: &'static str,
}

impl Default for Keyring {
    fn default() -> Self {
        Self::new(SERVICE)
    }
}

impl Keyring {
    /// Uses entries under `service`.
    #[must_use]
    pub const fn new(service: &'static str) -> Self {
        Self { service }
    }

    /// Entry name for the IMAP password of `id`.
    #[must_use]
    pub fn entry_name(&self, id: AccountId) -> String {
        format!("{}_imap_{id}", self.service)
    }

    fn entry(self, id: AccountId) -> CredentialResult<Entry> {
        Ok(Entry::new(self.service, &self.entry_name(id))?)
    }

    /// Saves the password of `id`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Keyring`] if the keyring rejects the write.
    pub fn set(self, id: AccountId, password: &str) -> CredentialResult<()> {
        self.entry(id)?.set_password(password)?;
        debug!(account = %id, "password stored in keyring");
        Ok(())
    }

    /// Reads the password of `id`; `None` if there is no entry.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Keyring`] if the keyring cannot be read.
    pub fn get(self, id: AccountId) -> CredentialResult<Option<String>> {
        match self.entry(id)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the password of `id`. A missing entry counts as removed.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Keyring`] if the keyring refuses.
    pub fn remove(self, id: AccountId) -> CredentialResult<()> {
        match self.entry(id)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Per-account password storage outside the database.
pub(crate) trait PasswordVault: Send + Sync {
    fn set(&self, id: AccountId, password: &str) -> CredentialResult<()>;
    fn get(&self, id: AccountId) -> CredentialResult<Option<String>>;
    fn remove(&self, id: AccountId) -> CredentialResult<()>;
}

impl PasswordVault for Keyring {
    fn set(&self, id: AccountId, password: &str) -> CredentialResult<()> {
        Self::set(*self, id, password)
    }

    fn get(&self, id: AccountId) -> CredentialResult<Option<String>> {
        Self::get(*self, id)
    }

    fn remove(&self, id: AccountId) -> CredentialResult<()> {
        Self::remove(*self, id)
    }
}
