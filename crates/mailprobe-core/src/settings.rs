//! User settings, stored as `settings.json` in the config directory.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::account::PasswordStorage;
use crate::discovery::{MAX_CONCURRENCY, ProviderRule};
use crate::{Error, Result};

/// Application directory name under the platform config/data directories.
const APP_DIR: &str = "mailprobe";

/// Discovery and storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-probe timeout in seconds.
    pub probe_timeout_secs: u64,
    /// Probes in flight at once.
    pub concurrency: usize,
    /// Optional ceiling on a whole discovery run, in seconds.
    pub overall_deadline_secs: Option<u64>,
    /// DNS query timeout in seconds.
    pub dns_timeout_secs: u64,
    /// DNS query attempts.
    pub dns_attempts: usize,
    /// Provider routing rules, checked in order.
    pub providers: Vec<ProviderRule>,
    /// Where passwords are stored.
    pub password_storage: PasswordStorage,
    /// Database file; defaults to `<data_dir>/mailprobe/mailprobe.db`.
    pub database_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 2,
            concurrency: 1,
            overall_deadline_secs: None,
            dns_timeout_secs: 5,
            dns_attempts: 2,
            providers: ProviderRule::defaults(),
            password_storage: PasswordStorage::default(),
            database_path: None,
        }
    }
}

impl Settings {
    /// Default location of the settings file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("settings.json")
    }

    /// Loads and validates settings from `path`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is malformed or fails
    /// validation, and [`Error::Io`] if it cannot be read.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Self::default().validate();
            }
            Err(e) => return Err(e.into()),
        };

        let settings: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "settings loaded");
        settings.validate()
    }

    /// Checks the values and clamps the concurrency into range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(mut self) -> Result<Self> {
        if self.probe_timeout_secs == 0 {
            return Err(Error::Config("probe_timeout_secs must be positive".to_string()));
        }
        if self.dns_timeout_secs == 0 {
            return Err(Error::Config("dns_timeout_secs must be positive".to_string()));
        }
        if self.overall_deadline_secs == Some(0) {
            return Err(Error::Config(
                "overall_deadline_secs must be positive".to_string(),
            ));
        }
        for rule in &self.providers {
            rule.validate().map_err(Error::Config)?;
        }
        self.concurrency = self.concurrency.clamp(1, MAX_CONCURRENCY);
        self.dns_attempts = self.dns_attempts.max(1);
        Ok(self)
    }

    /// Per-probe timeout.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// DNS query timeout.
    #[must_use]
    pub const fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    /// Ceiling on a whole discovery run, if any.
    #[must_use]
    pub fn overall_deadline(&self) -> Option<Duration> {
        self.overall_deadline_secs.map(Duration::from_secs)
    }

    /// Database file to use.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("mailprobe.db")
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "mailprobe-settings-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("mailprobe-settings-does-not-exist.json");
        let settings = Settings::load(&path).await.unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.probe_timeout(), Duration::from_secs(2));
        assert_eq!(settings.providers, vec![ProviderRule::google_apps()]);
        assert_eq!(settings.password_storage, PasswordStorage::Keyring);
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let path = temp_file(
            "partial",
            r#"{ "probe_timeout_secs": 5, "concurrency": 9, "password_storage": "database" }"#,
        );
        let settings = Settings::load(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.probe_timeout_secs, 5);
        assert_eq!(settings.concurrency, MAX_CONCURRENCY);
        assert_eq!(settings.password_storage, PasswordStorage::Database);
        assert_eq!(settings.dns_attempts, 2);
        assert_eq!(settings.overall_deadline(), None);
    }

    #[tokio::test]
    async fn test_malformed_file_is_config_error() {
        let path = temp_file("malformed", "{ not json");
        let result = Settings::load(&path).await;
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_custom_providers() {
        let path = temp_file(
            "providers",
            r#"{ "providers": [{
                "name": "Fastmail",
                "first_party_markers": ["fastmail"],
                "mx_marker": "messagingengine.com",
                "imap_host": "imap.fastmail.com"
            }] }"#,
        );
        let settings = Settings::load(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.providers.len(), 1);
        assert_eq!(settings.providers[0].imap_host, "imap.fastmail.com");
    }

    #[test]
    fn test_validation() {
        let zero_timeout = Settings {
            probe_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(matches!(zero_timeout.validate(), Err(Error::Config(_))));

        let mut bad_rule = ProviderRule::google_apps();
        bad_rule.mx_marker = String::new();
        let bad_rules = Settings {
            providers: vec![bad_rule],
            ..Settings::default()
        };
        assert!(matches!(bad_rules.validate(), Err(Error::Config(_))));

        let zero_concurrency = Settings {
            concurrency: 0,
            ..Settings::default()
        };
        assert_eq!(zero_concurrency.validate().unwrap().concurrency, 1);
    }

    #[test]
    fn test_database_path_override() {
        let settings = Settings {
            database_path: Some(PathBuf::from("/tmp/accounts.db")),
            ..Settings::default()
        };
        assert_eq!(settings.database_path(), PathBuf::from("/tmp/accounts.db"));
        assert!(
            Settings::default()
                .database_path()
                .ends_with("mailprobe/mailprobe.db")
        );
    }
}
