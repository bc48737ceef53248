//! Provider routing based on MX records.
//!
//! Some domains are hosted by a mail provider whose IMAP endpoint has
//! nothing to do with the domain itself. A [`ProviderRule`] recognises such
//! domains by the host of their preferred MX record and names the endpoint
//! to probe instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dns::MxResolver;

/// Routes domains served by a hosted-mail provider to its IMAP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRule {
    /// Human-readable provider name.
    pub name: String,
    /// Substrings marking the provider's own consumer domains. Such domains
    /// are probed directly and never trigger a DNS lookup for this rule.
    pub first_party_markers: Vec<String>,
    /// Substring the preferred MX host must contain.
    pub mx_marker: String,
    /// IMAP host to probe for matching domains.
    pub imap_host: String,
}

impl ProviderRule {
    /// Google Apps: domains whose mail is handled by Google.
    #[must_use]
    pub fn google_apps() -> Self {
        Self {
            name: "Google Apps".to_string(),
            first_party_markers: vec!["google".to_string(), "gmail".to_string()],
            mx_marker: "google".to_string(),
            imap_host: "imap.gmail.com".to_string(),
        }
    }

    /// The rules used when none are configured.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::google_apps()]
    }

    /// Returns true if `domain` belongs to the provider itself.
    #[must_use]
    pub fn is_first_party(&self, domain: &str) -> bool {
        self.first_party_markers
            .iter()
            .any(|marker| contains_ignore_case(domain, marker))
    }

    /// Returns true if `mx_host` is one of the provider's exchangers.
    #[must_use]
    pub fn matches_mx(&self, mx_host: &str) -> bool {
        contains_ignore_case(mx_host, &self.mx_marker)
    }

    /// Checks that no field is empty.
    ///
    /// # Errors
    ///
    /// Returns a description of the first empty field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("provider rule has an empty name".to_string());
        }
        if self.mx_marker.trim().is_empty() {
            return Err(format!("provider rule {:?} has an empty mx_marker", self.name));
        }
        if self.imap_host.trim().is_empty() {
            return Err(format!("provider rule {:?} has an empty imap_host", self.name));
        }
        if self.first_party_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(format!(
                "provider rule {:?} has an empty first-party marker",
                self.name
            ));
        }
        Ok(())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Decides whether a domain is routed through a known provider.
#[derive(Debug)]
pub struct DomainClassifier<R> {
    resolver: R,
    rules: Vec<ProviderRule>,
}

impl<R: MxResolver> DomainClassifier<R> {
    /// Creates a classifier with the default rules.
    #[must_use]
    pub fn new(resolver: R) -> Self {
        Self::with_rules(resolver, ProviderRule::defaults())
    }

    /// Creates a classifier with custom rules, checked in order.
    #[must_use]
    pub const fn with_rules(resolver: R, rules: Vec<ProviderRule>) -> Self {
        Self { resolver, rules }
    }

    /// Returns the first rule that routes `domain`, if any.
    ///
    /// MX records are resolved at most once, and not at all when every rule
    /// recognises `domain` as first-party. Resolution failures and empty
    /// answers mean "no route".
    pub async fn route(&self, domain: &str) -> Option<&ProviderRule> {
        let applicable: Vec<&ProviderRule> = self
            .rules
            .iter()
            .filter(|rule| !rule.is_first_party(domain))
            .collect();
        if applicable.is_empty() {
            debug!(domain, "first-party domain, skipping MX lookup");
            return None;
        }

        let records = match self.resolver.resolve_mx(domain).await {
            Ok(records) => records,
            Err(e) => {
                debug!(domain, error = %e, "MX lookup failed, probing domain directly");
                return None;
            }
        };

        let preferred = records.iter().min_by_key(|record| record.priority)?;
        let rule = applicable
            .into_iter()
            .find(|rule| rule.matches_mx(&preferred.host))?;

        info!(domain, provider = %rule.name, mx = %preferred.host, "domain routed to provider");
        Some(rule)
    }

    /// Returns true if `domain` should be probed through a provider endpoint.
    pub async fn classify(&self, domain: &str) -> bool {
        self.route(domain).await.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::discovery::dns::MxRecord;
    use crate::discovery::testing::StubResolver;

    #[tokio::test]
    async fn test_first_party_domains_skip_dns() {
        let resolver = StubResolver::records(vec![MxRecord::new("aspmx.l.google.com", 1)]);
        let calls = resolver.calls();
        let classifier = DomainClassifier::new(resolver);

        assert!(!classifier.classify("gmail.com").await);
        assert!(!classifier.classify("GoogleMail.com").await);
        assert!(!classifier.classify("mail.GMAIL.co.uk").await);
        assert_eq!(calls.count(), 0);
    }

    #[tokio::test]
    async fn test_google_hosted_domain() {
        let resolver = StubResolver::records(vec![
            MxRecord::new("alt1.aspmx.l.google.com", 5),
            MxRecord::new("aspmx.l.google.com", 1),
        ]);
        let calls = resolver.calls();
        let classifier = DomainClassifier::new(resolver);

        let rule = classifier.route("example.org").await.unwrap();
        assert_eq!(rule.imap_host, "imap.gmail.com");
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test]
    async fn test_only_preferred_mx_counts() {
        let resolver = StubResolver::records(vec![
            MxRecord::new("mx.example.org", 10),
            MxRecord::new("aspmx.l.google.com", 20),
        ]);
        let classifier = DomainClassifier::new(resolver);

        assert!(!classifier.classify("example.org").await);
    }

    #[tokio::test]
    async fn test_mx_marker_is_case_insensitive() {
        let resolver = StubResolver::records(vec![MxRecord::new("ASPMX.L.GOOGLE.COM", 1)]);
        let classifier = DomainClassifier::new(resolver);

        assert!(classifier.classify("example.org").await);
    }

    #[tokio::test]
    async fn test_resolution_failure_is_false() {
        let resolver = StubResolver::failing("SERVFAIL");
        let calls = resolver.calls();
        let classifier = DomainClassifier::new(resolver);

        assert!(!classifier.classify("example.org").await);
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test]
    async fn test_no_records_is_false() {
        let classifier = DomainClassifier::new(StubResolver::records(Vec::new()));

        assert!(!classifier.classify("example.org").await);
    }

    #[tokio::test]
    async fn test_custom_rules_share_one_lookup() {
        let resolver = StubResolver::records(vec![MxRecord::new(
            "example-org.mail.protection.outlook.com",
            0,
        )]);
        let calls = resolver.calls();
        let outlook = ProviderRule {
            name: "Microsoft 365".to_string(),
            first_party_markers: vec!["outlook".to_string(), "hotmail".to_string()],
            mx_marker: "protection.outlook.com".to_string(),
            imap_host: "outlook.office365.com".to_string(),
        };
        let classifier =
            DomainClassifier::with_rules(resolver, vec![ProviderRule::google_apps(), outlook]);

        let rule = classifier.route("example.org").await.unwrap();
        assert_eq!(rule.name, "Microsoft 365");
        assert_eq!(calls.count(), 1);
    }

    #[test]
    fn test_rule_validation() {
        assert!(ProviderRule::google_apps().validate().is_ok());

        let mut rule = ProviderRule::google_apps();
        rule.imap_host = " ".to_string();
        assert!(rule.validate().is_err());

        let mut rule = ProviderRule::google_apps();
        rule.first_party_markers.push(String::new());
        assert!(rule.validate().is_err());
    }
}
