//! Account model types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a stored account, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl AccountId {
    /// Create a new account ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the local user who owns discovered accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    /// Create a new owner ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the owner ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport security mode of an inbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// Implicit TLS from connect time.
    Ssl,
    /// Plaintext connect, then a mandatory STARTTLS upgrade.
    Tls,
    /// Plaintext.
    None,
}

impl Security {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ssl => "ssl",
            Self::Tls => "tls",
            Self::None => "none",
        }
    }

    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Ssl => "SSL/TLS",
            Self::Tls => "STARTTLS",
            Self::None => "None (insecure)",
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Security {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ssl" => Ok(Self::Ssl),
            "tls" => Ok(Self::Tls),
            "none" => Ok(Self::None),
            other => Err(format!("unknown security mode {other:?}")),
        }
    }
}

impl From<Security> for mailprobe_imap::Security {
    fn from(security: Security) -> Self {
        match security {
            Security::Ssl => Self::Implicit,
            Security::Tls => Self::StartTls,
            Security::None => Self::None,
        }
    }
}

/// Email address and password supplied by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Full email address; also the IMAP login name.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from an address and password.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A working inbound configuration that has not been stored yet.
#[derive(Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Owner of the account.
    pub owner_id: OwnerId,
    /// Display name (the email address).
    pub name: String,
    /// Email address.
    pub email: String,
    /// IMAP host that accepted the login.
    pub inbound_host: String,
    /// IMAP port that accepted the login.
    pub inbound_port: u16,
    /// Security mode that accepted the login.
    pub inbound_security: Security,
    /// Login name.
    pub inbound_user: String,
    /// Login password.
    pub inbound_password: String,
}

impl NewAccount {
    /// Attaches the identifier assigned by the store.
    #[must_use]
    pub fn with_id(self, id: AccountId) -> DiscoveredAccount {
        DiscoveredAccount {
            id,
            owner_id: self.owner_id,
            name: self.name,
            email: self.email,
            inbound_host: self.inbound_host,
            inbound_port: self.inbound_port,
            inbound_security: self.inbound_security,
            inbound_user: self.inbound_user,
            inbound_password: self.inbound_password,
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("owner_id", &self.owner_id)
            .field("email", &self.email)
            .field("inbound_host", &self.inbound_host)
            .field("inbound_port", &self.inbound_port)
            .field("inbound_security", &self.inbound_security)
            .field("inbound_user", &self.inbound_user)
            .finish_non_exhaustive()
    }
}

/// A stored inbound account configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct DiscoveredAccount {
    /// Identifier assigned by the store.
    pub id: AccountId,
    /// Owner of the account.
    pub owner_id: OwnerId,
    /// Display name (the email address).
    pub name: String,
    /// Email address.
    pub email: String,
    /// IMAP host.
    pub inbound_host: String,
    /// IMAP port.
    pub inbound_port: u16,
    /// Security mode.
    pub inbound_security: Security,
    /// Login name.
    pub inbound_user: String,
    /// Login password.
    pub inbound_password: String,
}

impl fmt::Debug for DiscoveredAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredAccount")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("email", &self.email)
            .field("inbound_host", &self.inbound_host)
            .field("inbound_port", &self.inbound_port)
            .field("inbound_security", &self.inbound_security)
            .field("inbound_user", &self.inbound_user)
            .finish_non_exhaustive()
    }
}
