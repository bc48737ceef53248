//! Call-counting stubs for the discovery seams.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::dns::{MxRecord, MxResolver, ResolveError};
use super::probe::{ProbeAttempt, ProbeObserver, ProbeOutcome, ProbeRequest, Prober};
use crate::account::{AccountId, AccountStore, DiscoveredAccount, NewAccount, OwnerId, Security};
use crate::error::StoreError;

/// Shared call counter.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct StubResolver {
    answer: Result<Vec<MxRecord>, ResolveError>,
    calls: Calls,
}

impl StubResolver {
    pub fn records(records: Vec<MxRecord>) -> Self {
        Self {
            answer: Ok(records),
            calls: Calls::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(ResolveError(message.to_string())),
            calls: Calls::default(),
        }
    }

    pub fn calls(&self) -> Calls {
        self.calls.clone()
    }
}

impl MxResolver for StubResolver {
    async fn resolve_mx(&self, _domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        self.calls.hit();
        self.answer.clone()
    }
}

/// Open/closed bookkeeping for fake sessions.
#[derive(Debug, Clone, Default)]
pub struct Sessions {
    opened: Calls,
    closed: Calls,
}

impl Sessions {
    pub fn opened(&self) -> usize {
        self.opened.count()
    }

    pub fn closed(&self) -> usize {
        self.closed.count()
    }

    fn open(&self) -> SessionGuard {
        self.opened.hit();
        SessionGuard(self.closed.clone())
    }
}

/// Counts as closed when dropped, whether the probe finished or was cancelled.
struct SessionGuard(Calls);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.hit();
    }
}

/// Prober that accepts exactly one (host, port, security) triple.
pub struct StubProber {
    succeed_on: Option<(String, u16, Security)>,
    delay: Duration,
    requests: Arc<Mutex<Vec<ProbeRequest>>>,
    sessions: Sessions,
}

impl StubProber {
    pub fn failing() -> Self {
        Self {
            succeed_on: None,
            delay: Duration::ZERO,
            requests: Arc::default(),
            sessions: Sessions::default(),
        }
    }

    pub fn succeeding_on(host: &str, port: u16, security: Security) -> Self {
        Self {
            succeed_on: Some((host.to_string(), port, security)),
            ..Self::failing()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<ProbeRequest>>> {
        Arc::clone(&self.requests)
    }

    pub fn sessions(&self) -> Sessions {
        self.sessions.clone()
    }
}

impl Prober for StubProber {
    async fn probe(&self, request: &ProbeRequest) -> ProbeOutcome {
        let _session = self.sessions.open();
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let target = (request.host.clone(), request.port, request.security);
        if self.succeed_on.as_ref() == Some(&target) {
            ProbeOutcome::Success {
                host: request.host.clone(),
                port: request.port,
                security: request.security,
            }
        } else {
            ProbeOutcome::Failure {
                reason: "connection refused".to_string(),
            }
        }
    }

    fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(2)
    }
}

/// In-memory store with an optional forced failure.
#[derive(Default)]
pub struct StubStore {
    saved: Arc<Mutex<Vec<DiscoveredAccount>>>,
    fail: bool,
}

impl StubStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Arc<Mutex<Vec<DiscoveredAccount>>> {
        Arc::clone(&self.saved)
    }
}

impl AccountStore for StubStore {
    async fn save(&self, account: NewAccount) -> Result<DiscoveredAccount, StoreError> {
        if self.fail {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        let mut saved = self.saved.lock().unwrap();
        let id = AccountId::new(i64::try_from(saved.len()).unwrap() + 1);
        let account = account.with_id(id);
        saved.push(account.clone());
        Ok(account)
    }

    async fn find_all_for(&self, owner: &OwnerId) -> Result<Vec<DiscoveredAccount>, StoreError> {
        let saved = self.saved.lock().unwrap();
        let accounts: Vec<_> = saved
            .iter()
            .filter(|a| &a.owner_id == owner)
            .cloned()
            .collect();
        if accounts.is_empty() {
            return Err(StoreError::NotFound(owner.clone()));
        }
        Ok(accounts)
    }
}

/// Observer that keeps a copy of every report.
#[derive(Default)]
pub struct RecordingObserver {
    pub reports: Mutex<Vec<String>>,
}

impl ProbeObserver for RecordingObserver {
    fn record(&self, attempt: &ProbeAttempt<'_>) {
        self.reports.lock().unwrap().push(format!("{attempt:?}"));
    }
}
