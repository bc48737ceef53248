//! Live connection probes.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use mailprobe_imap::{Config, connect};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

use super::matrix::ProbeCandidate;
use crate::account::{Credentials, Security};

/// Default per-attempt timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything needed for one authenticated handshake.
#[derive(Clone)]
pub struct ProbeRequest {
    /// Host to connect to.
    pub host: String,
    /// Port to connect to.
    pub port: u16,
    /// Login name.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Security mode.
    pub security: Security,
}

impl ProbeRequest {
    /// Builds the request for `candidate`, logging in as the full address.
    #[must_use]
    pub fn new(candidate: &ProbeCandidate, credentials: &Credentials) -> Self {
        Self {
            host: candidate.host.clone(),
            port: candidate.port,
            user: credentials.email.clone(),
            password: credentials.password.clone(),
            security: candidate.security,
        }
    }
}

impl fmt::Debug for ProbeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("security", &self.security)
            .finish_non_exhaustive()
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server accepted the login with these parameters.
    Success {
        /// Host.
        host: String,
        /// Port.
        port: u16,
        /// Security mode.
        security: Security,
    },
    /// The attempt failed for any reason.
    Failure {
        /// Human-readable cause.
        reason: String,
    },
}

impl ProbeOutcome {
    /// Returns true for [`ProbeOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Performs one authenticated handshake.
pub trait Prober {
    /// Attempts to log in with `request`.
    ///
    /// Never fails: every error becomes [`ProbeOutcome::Failure`]. Must
    /// complete within [`Prober::attempt_timeout`].
    fn probe(&self, request: &ProbeRequest) -> impl Future<Output = ProbeOutcome> + Send;

    /// Upper bound on the duration of a single probe.
    fn attempt_timeout(&self) -> Duration;
}

/// [`Prober`] that performs a real IMAP LOGIN.
#[derive(Debug, Clone)]
pub struct ImapProber {
    timeout: Duration,
}

impl ImapProber {
    /// Creates a prober with the given per-attempt timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ImapProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl Prober for ImapProber {
    async fn probe(&self, request: &ProbeRequest) -> ProbeOutcome {
        // Connect, login and logout all share one budget.
        let deadline = Instant::now() + self.timeout;
        let config = Config::new(request.host.as_str(), request.port, request.security.into())
            .with_timeout(self.timeout);

        let login = async {
            let client = connect(&config).await?;
            client.login(&request.user, &request.password).await
        };

        let client = match timeout_at(deadline, login).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                if e.is_auth_rejection() {
                    debug!(host = %request.host, port = request.port, "endpoint answered, login refused");
                }
                return ProbeOutcome::Failure {
                    reason: e.to_string(),
                };
            }
            Err(_) => {
                return ProbeOutcome::Failure {
                    reason: format!("timed out after {:?}", self.timeout),
                };
            }
        };

        // The login already proved the parameters; a failed LOGOUT is noise.
        match timeout_at(deadline, client.logout()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(host = %request.host, error = %e, "LOGOUT failed"),
            Err(_) => debug!(host = %request.host, "LOGOUT timed out"),
        }

        ProbeOutcome::Success {
            host: request.host.clone(),
            port: request.port,
            security: request.security,
        }
    }

    fn attempt_timeout(&self) -> Duration {
        self.timeout
    }
}

/// Report of one finished probe. Carries no password.
#[derive(Debug, Clone, Copy)]
pub struct ProbeAttempt<'a> {
    /// Host.
    pub host: &'a str,
    /// Port.
    pub port: u16,
    /// Login name.
    pub user: &'a str,
    /// Security mode.
    pub security: Security,
    /// Outcome.
    pub outcome: &'a ProbeOutcome,
    /// How long the probe took.
    pub elapsed: Duration,
}

impl<'a> ProbeAttempt<'a> {
    /// Builds the report for `request`.
    #[must_use]
    pub fn new(request: &'a ProbeRequest, outcome: &'a ProbeOutcome, elapsed: Duration) -> Self {
        Self {
            host: &request.host,
            port: request.port,
            user: &request.user,
            security: request.security,
            outcome,
            elapsed,
        }
    }
}

/// Receives a report for every probe.
pub trait ProbeObserver {
    /// Called once per probe, including probes cancelled before they finish.
    fn record(&self, attempt: &ProbeAttempt<'_>);
}

/// Emits probe reports as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProbeObserver for TracingObserver {
    fn record(&self, attempt: &ProbeAttempt<'_>) {
        match attempt.outcome {
            ProbeOutcome::Success { .. } => info!(
                host = attempt.host,
                port = attempt.port,
                user = attempt.user,
                security = %attempt.security,
                elapsed_ms = attempt.elapsed.as_millis(),
                "probe succeeded"
            ),
            ProbeOutcome::Failure { reason } => debug!(
                host = attempt.host,
                port = attempt.port,
                user = attempt.user,
                security = %attempt.security,
                elapsed_ms = attempt.elapsed.as_millis(),
                reason = %reason,
                "probe failed"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    use super::*;

    fn request(port: u16, security: Security, password: &str) -> ProbeRequest {
        ProbeRequest {
            host: "127.0.0.1".to_string(),
            port,
            user: "alice@example.com".to_string(),
            password: password.to_string(),
            security,
        }
    }

    /// Accepts one connection and plays a minimal plaintext IMAP server that
    /// accepts only `password`.
    async fn fake_server(password: &'static str) -> u16 {
        spawn_server(password, true).await
    }

    /// Like [`fake_server`], optionally leaving LOGOUT unanswered.
    async fn spawn_server(password: &'static str, answers_logout: bool) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = socket.into_split();
            let mut lines = BufReader::new(read_half).lines();

            write_half.write_all(b"* OK ready\r\n").await.unwrap();
            while let Ok(Some(line)) = lines.next_line().await {
                let mut parts = line.split(' ');
                let tag = parts.next().unwrap_or_default();
                let reply = match parts.next().unwrap_or_default() {
                    "LOGIN" if line.ends_with(password) => format!("{tag} OK welcome\r\n"),
                    "LOGIN" => format!("{tag} NO [AUTHENTICATIONFAILED] nope\r\n"),
                    "CAPABILITY" => format!("* CAPABILITY IMAP4rev1\r\n{tag} OK done\r\n"),
                    "LOGOUT" if !answers_logout => continue,
                    "LOGOUT" => format!("* BYE bye\r\n{tag} OK done\r\n"),
                    _ => format!("{tag} BAD unknown\r\n"),
                };
                if write_half.write_all(reply.as_bytes()).await.is_err() {
                    return;
                }
            }
        });

        port
    }

    #[tokio::test]
    async fn test_probe_success_against_plaintext_server() {
        let port = fake_server("secret").await;
        let prober = ImapProber::new(Duration::from_secs(2));

        let outcome = prober.probe(&request(port, Security::None, "secret")).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Success {
                host: "127.0.0.1".to_string(),
                port,
                security: Security::None,
            }
        );
    }

    #[tokio::test]
    async fn test_probe_wrong_password_is_failure() {
        let port = fake_server("secret").await;
        let prober = ImapProber::new(Duration::from_secs(2));

        let outcome = prober.probe(&request(port, Security::None, "wrong")).await;
        assert!(matches!(outcome, ProbeOutcome::Failure { reason } if reason.starts_with("login rejected")));
    }

    #[tokio::test]
    async fn test_probe_starttls_without_capability_is_failure() {
        let port = fake_server("secret").await;
        let prober = ImapProber::new(Duration::from_secs(2));

        let outcome = prober.probe(&request(port, Security::Tls, "secret")).await;
        assert!(
            matches!(&outcome, ProbeOutcome::Failure { reason } if reason.contains("does not offer STARTTLS")),
            "{outcome:?}"
        );
    }

    #[tokio::test]
    async fn test_unanswered_logout_stays_within_attempt_timeout() {
        let port = spawn_server("secret", false).await;
        let prober = ImapProber::new(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let outcome = prober.probe(&request(port, Security::None, "secret")).await;

        assert!(outcome.is_success());
        assert!(started.elapsed() < Duration::from_millis(600), "{:?}", started.elapsed());
    }

    #[tokio::test]
    async fn test_probe_refused_connection_is_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = ImapProber::default()
            .probe(&request(port, Security::Ssl, "secret"))
            .await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_probe_times_out_on_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let prober = ImapProber::new(Duration::from_millis(200));
        let outcome = prober.probe(&request(port, Security::None, "secret")).await;
        assert!(matches!(outcome, ProbeOutcome::Failure { reason } if reason.contains("timed out")));
    }

    #[test]
    fn test_request_debug_hides_password() {
        let req = request(143, Security::None, "hunter2");
        assert!(!format!("{req:?}").contains("hunter2"));

        let outcome = ProbeOutcome::Failure {
            reason: "x".to_string(),
        };
        let attempt = ProbeAttempt::new(&req, &outcome, Duration::ZERO);
        assert!(!format!("{attempt:?}").contains("hunter2"));
    }
}
