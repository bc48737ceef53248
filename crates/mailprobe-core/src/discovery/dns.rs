//! MX record resolution.

use std::future::Future;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use tracing::debug;

/// A mail exchanger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    /// Exchanger host name, lowercase, without the trailing dot.
    pub host: String,
    /// Preference value; lower is preferred.
    pub priority: u16,
}

impl MxRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(host: impl Into<String>, priority: u16) -> Self {
        Self {
            host: host.into(),
            priority,
        }
    }
}

/// MX lookup failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("MX lookup failed: {0}")]
pub struct ResolveError(pub String);

/// Resolves MX records for a domain.
pub trait MxResolver {
    /// Returns the MX records of `domain` in no particular order.
    ///
    /// A domain without MX records yields an empty list.
    fn resolve_mx(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Vec<MxRecord>, ResolveError>> + Send;
}

/// [`MxResolver`] backed by the system DNS configuration.
pub struct DnsMxResolver {
    resolver: TokioAsyncResolver,
}

impl DnsMxResolver {
    /// Creates a resolver with the given per-query timeout and attempt count.
    #[must_use]
    pub fn new(timeout: Duration, attempts: usize) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = attempts;
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

impl std::fmt::Debug for DnsMxResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsMxResolver").finish_non_exhaustive()
    }
}

impl MxResolver for DnsMxResolver {
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => {
                let records: Vec<_> = lookup
                    .iter()
                    .map(|mx| {
                        let host = mx.exchange().to_string().to_lowercase();
                        MxRecord::new(host.trim_end_matches('.'), mx.preference())
                    })
                    .collect();
                debug!(domain, count = records.len(), "MX lookup complete");
                Ok(records)
            }
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                debug!(domain, "no MX records");
                Ok(Vec::new())
            }
            Err(e) => Err(ResolveError(e.to_string())),
        }
    }
}
