//! The ordered set of connection parameters tried for a host.

use std::iter::FusedIterator;

use crate::account::Security;

/// Host prefixes, tried in order.
pub const HOST_PREFIXES: [&str; 2] = ["", "imap."];

/// Ports, tried in order for each prefix: IMAP, IMAP4-SSL, IMAPS.
pub const PORTS: [u16; 3] = [143, 585, 993];

/// Security modes, tried in order for each port.
pub const SECURITY_MODES: [Security; 3] = [Security::Ssl, Security::Tls, Security::None];

/// Number of candidates per base host.
pub const CANDIDATE_COUNT: usize = HOST_PREFIXES.len() * PORTS.len() * SECURITY_MODES.len();

/// One set of connection parameters to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCandidate {
    /// Prefix prepended to the base host.
    pub host_prefix: &'static str,
    /// Effective host (`host_prefix` + base host).
    pub host: String,
    /// Port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
}

/// Iterator over the candidates for a base host.
///
/// Order, outermost first: prefix, port, security mode. A clone continues
/// independently from the same position.
#[derive(Debug, Clone)]
pub struct Candidates {
    base_host: String,
    next: usize,
}

/// Returns the candidates for `base_host`.
#[must_use]
pub fn candidates(base_host: &str) -> Candidates {
    Candidates {
        base_host: base_host.to_string(),
        next: 0,
    }
}

impl Iterator for Candidates {
    type Item = ProbeCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= CANDIDATE_COUNT {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let per_prefix = PORTS.len() * SECURITY_MODES.len();
        let host_prefix = HOST_PREFIXES[index / per_prefix];
        let port = PORTS[(index / SECURITY_MODES.len()) % PORTS.len()];
        let security = SECURITY_MODES[index % SECURITY_MODES.len()];

        Some(ProbeCandidate {
            host_prefix,
            host: format!("{host_prefix}{}", self.base_host),
            port,
            security,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = CANDIDATE_COUNT.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Candidates {}

impl FusedIterator for Candidates {}
