//! The discovery search: classify, probe in order, store the first success.

use std::pin::pin;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::address::split_address;
use super::classifier::DomainClassifier;
use super::dns::MxResolver;
use super::matrix::{CANDIDATE_COUNT, ProbeCandidate, candidates};
use super::probe::{ProbeAttempt, ProbeObserver, ProbeOutcome, ProbeRequest, Prober, TracingObserver};
use crate::Result;
use crate::account::{AccountStore, Credentials, DiscoveredAccount, NewAccount, OwnerId, Security};

/// Highest number of probes allowed in flight at once.
pub const MAX_CONCURRENCY: usize = 4;

/// Result of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// A working configuration was found and stored.
    Found(DiscoveredAccount),
    /// No candidate accepted the credentials. Nothing was stored.
    NotFound,
}

/// Finds and stores working IMAP parameters for an email address.
///
/// Candidates are probed in matrix order. With a concurrency above one,
/// several probes run at once but results are still taken in order, so the
/// earliest candidate that works always wins; probes still in flight at that
/// point are dropped, closing their connections, and reported as cancelled.
pub struct Discovery<R, P, S, O = TracingObserver> {
    classifier: DomainClassifier<R>,
    prober: P,
    store: S,
    observer: O,
    concurrency: usize,
    overall_deadline: Option<Duration>,
}

impl<R, P, S> Discovery<R, P, S>
where
    R: MxResolver,
    P: Prober,
    S: AccountStore,
{
    /// Creates a sequential discovery that reports probes through `tracing`.
    pub const fn new(classifier: DomainClassifier<R>, prober: P, store: S) -> Self {
        Self {
            classifier,
            prober,
            store,
            observer: TracingObserver,
            concurrency: 1,
            overall_deadline: None,
        }
    }
}

impl<R, P, S, O> Discovery<R, P, S, O>
where
    R: MxResolver,
    P: Prober,
    S: AccountStore,
    O: ProbeObserver,
{
    /// Replaces the probe observer.
    pub fn with_observer<O2: ProbeObserver>(self, observer: O2) -> Discovery<R, P, S, O2> {
        Discovery {
            classifier: self.classifier,
            prober: self.prober,
            store: self.store,
            observer,
            concurrency: self.concurrency,
            overall_deadline: self.overall_deadline,
        }
    }

    /// Sets how many probes may be in flight at once, clamped to
    /// `1..=MAX_CONCURRENCY`.
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Sets a hard ceiling on the whole search. An aborted search reports
    /// [`DiscoveryOutcome::NotFound`].
    #[must_use]
    pub const fn overall_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.overall_deadline = deadline;
        self
    }

    /// Upper bound on the time spent probing.
    ///
    /// `ceil(18 / concurrency)` rounds of one probe timeout each, capped by
    /// the overall deadline when one is set.
    pub fn worst_case_latency(&self) -> Duration {
        let rounds = CANDIDATE_COUNT.div_ceil(self.concurrency);
        let bound = self
            .prober
            .attempt_timeout()
            .saturating_mul(u32::try_from(rounds).unwrap_or(u32::MAX));
        self.overall_deadline.map_or(bound, |deadline| bound.min(deadline))
    }

    /// Discovers, stores and returns a working configuration for `email`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidAddress`] before any network activity if
    /// `email` has no `@`, an empty local part or an empty domain, and
    /// [`crate::Error::Store`] if saving the discovered account fails.
    pub async fn discover(
        &self,
        owner_id: &OwnerId,
        email: &str,
        password: &str,
    ) -> Result<DiscoveryOutcome> {
        let (_, domain) = split_address(email)?;

        let base_host = match self.classifier.route(domain).await {
            Some(rule) => rule.imap_host.as_str(),
            None => domain,
        };
        info!(email, base_host, "starting discovery");

        let credentials = Credentials::new(email, password);
        let search = self.search(base_host, &credentials);
        let found = match self.overall_deadline {
            Some(deadline) => tokio::time::timeout(deadline, search)
                .await
                .unwrap_or_else(|_| {
                    warn!(email, ?deadline, "discovery deadline reached");
                    None
                }),
            None => search.await,
        };

        let Some((host, port, security)) = found else {
            info!(email, "no working configuration found");
            return Ok(DiscoveryOutcome::NotFound);
        };

        let account = self
            .store
            .save(NewAccount {
                owner_id: owner_id.clone(),
                name: email.to_string(),
                email: email.to_string(),
                inbound_host: host,
                inbound_port: port,
                inbound_security: security,
                inbound_user: credentials.email,
                inbound_password: credentials.password,
            })
            .await?;

        info!(
            email,
            id = %account.id,
            host = %account.inbound_host,
            port = account.inbound_port,
            security = %account.inbound_security,
            "account discovered"
        );
        Ok(DiscoveryOutcome::Found(account))
    }

    /// Probes the candidates for `base_host` and returns the first success.
    async fn search(
        &self,
        base_host: &str,
        credentials: &Credentials,
    ) -> Option<(String, u16, Security)> {
        let mut attempts = pin!(
            stream::iter(candidates(base_host))
                .map(|candidate| self.attempt(candidate, credentials))
                .buffered(self.concurrency)
        );

        while let Some(outcome) = attempts.next().await {
            if let ProbeOutcome::Success {
                host,
                port,
                security,
            } = outcome
            {
                return Some((host, port, security));
            }
        }
        debug!(base_host, "all candidates failed");
        None
    }

    async fn attempt(&self, candidate: ProbeCandidate, credentials: &Credentials) -> ProbeOutcome {
        let request = ProbeRequest::new(&candidate, credentials);
        let mut report = PendingReport::new(&self.observer, &request);
        let outcome = self.prober.probe(&request).await;
        report.finish(&outcome);
        outcome
    }
}

/// Reports an attempt exactly once, as cancelled if it is dropped unfinished.
///
/// Probes still in flight when a better candidate wins, or when the overall
/// deadline fires, are dropped mid-await; they opened a connection and are
/// reported all the same.
struct PendingReport<'a, O: ProbeObserver> {
    observer: &'a O,
    request: &'a ProbeRequest,
    started: Instant,
    reported: bool,
}

impl<'a, O: ProbeObserver> PendingReport<'a, O> {
    fn new(observer: &'a O, request: &'a ProbeRequest) -> Self {
        Self {
            observer,
            request,
            started: Instant::now(),
            reported: false,
        }
    }

    fn finish(&mut self, outcome: &ProbeOutcome) {
        self.reported = true;
        self.observer
            .record(&ProbeAttempt::new(self.request, outcome, self.started.elapsed()));
    }
}

impl<O: ProbeObserver> Drop for PendingReport<'_, O> {
    fn drop(&mut self) {
        if !self.reported {
            let outcome = ProbeOutcome::Failure {
                reason: "cancelled".to_string(),
            };
            self.finish(&outcome);
        }
    }
}
