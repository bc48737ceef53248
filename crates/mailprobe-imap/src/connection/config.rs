//! Where to connect and how long to wait.

use std::fmt;
use std::time::Duration;

/// How the connection is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Security {
    /// Cleartext for the whole session, password included.
    None,
    /// Cleartext greeting, then STARTTLS before LOGIN.
    StartTls,
    /// TLS handshake before the first IMAP byte.
    #[default]
    Implicit,
}

impl Security {
    /// Whether the stream is encrypted before LOGIN is sent.
    #[must_use]
    pub const fn protects_login(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "plaintext",
            Self::StartTls => "STARTTLS",
            Self::Implicit => "TLS",
        })
    }
}

/// Time limits applied while opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit on the TCP connect plus any implicit TLS handshake.
    pub connect: Duration,
    /// Limit on each exchange afterwards (greeting, CAPABILITY, STARTTLS).
    pub exchange: Duration,
}

impl Timeouts {
    /// Same limit for every phase.
    #[must_use]
    pub const fn uniform(limit: Duration) -> Self {
        Self {
            connect: limit,
            exchange: limit,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            exchange: Duration::from_secs(30),
        }
    }
}

/// One server endpoint together with its security mode and time limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hostname, also used as the TLS server name.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Time limits.
    pub timeouts: Timeouts,
}

impl Config {
    /// Describes `host:port` reached with `security`, using default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, security: Security) -> Self {
        Self {
            host: host.into(),
            port,
            security,
            timeouts: Timeouts::default(),
        }
    }

    /// Replaces the time limits.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Applies one limit to every phase.
    #[must_use]
    pub const fn with_timeout(self, limit: Duration) -> Self {
        self.with_timeouts(Timeouts::uniform(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cleartext_exposes_login() {
        assert!(!Security::None.protects_login());
        assert!(Security::StartTls.protects_login());
        assert!(Security::Implicit.protects_login());
    }

    #[test]
    fn test_explicit_port_is_kept() {
        let config = Config::new("mail.example.com", 585, Security::Implicit)
            .with_timeout(Duration::from_secs(2));

        assert_eq!(config.port, 585);
        assert_eq!(config.timeouts, Timeouts::uniform(Duration::from_secs(2)));
    }

    #[test]
    fn test_default_timeouts() {
        let config = Config::new("imap.example.com", 143, Security::StartTls);
        assert_eq!(config.timeouts, Timeouts::default());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Security::StartTls.to_string(), "STARTTLS");
        assert_eq!(Security::Implicit.to_string(), "TLS");
    }
}
