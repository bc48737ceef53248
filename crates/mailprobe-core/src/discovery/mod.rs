//! IMAP connection-parameter discovery.
//!
//! Given an email address and password, [`Discovery`] decides which host to
//! probe ([`DomainClassifier`]), walks the fixed candidate matrix
//! ([`candidates`]) through a [`Prober`], and stores the first configuration
//! that accepts the login.
//!
//! ```ignore
//! use std::time::Duration;
//! use mailprobe_core::discovery::{Discovery, DnsMxResolver, DomainClassifier, ImapProber};
//! use mailprobe_core::{OwnerId, SqliteAccountStore};
//!
//! let classifier = DomainClassifier::new(DnsMxResolver::new(Duration::from_secs(5), 2));
//! let store = SqliteAccountStore::in_memory().await?;
//! let discovery = Discovery::new(classifier, ImapProber::default(), store);
//! let outcome = discovery
//!     .discover(&OwnerId::new("alice"), "alice@example.com", "password")
//!     .await?;
//! ```

mod address;
mod classifier;
mod dns;
mod matrix;
mod orchestrator;
mod probe;

#[cfg(test)]
pub(crate) mod testing;

pub use address::split_address;
pub use classifier::{DomainClassifier, ProviderRule};
pub use dns::{DnsMxResolver, MxRecord, MxResolver, ResolveError};
pub use matrix::{
    CANDIDATE_COUNT, Candidates, HOST_PREFIXES, PORTS, ProbeCandidate, SECURITY_MODES, candidates,
};
pub use orchestrator::{Discovery, DiscoveryOutcome, MAX_CONCURRENCY};
pub use probe::{
    DEFAULT_PROBE_TIMEOUT, ImapProber, ProbeAttempt, ProbeObserver, ProbeOutcome, ProbeRequest,
    Prober, TracingObserver,
};
