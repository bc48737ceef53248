//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Discovers working IMAP connection settings for an email account.",
    long_about = "mailprobe tries the usual host, port and security combinations for an \
                  email address, logs in to each in turn, and stores the first one that works."
)]
pub struct Args {
    /// Settings file (JSON). Defaults to the platform config directory.
    #[arg(long, global = true, env = "MAILPROBE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Account database file. Overrides the settings file.
    #[arg(long, global = true, env = "MAILPROBE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Per-probe timeout in seconds. Overrides the settings file.
    #[arg(long, global = true, env = "MAILPROBE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Probes in flight at once (1-4). Overrides the settings file.
    #[arg(long, global = true, env = "MAILPROBE_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Log debug output, including every probe.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find and store working IMAP settings for an email address.
    Discover {
        /// Owner of the stored account.
        #[arg(long)]
        owner: String,

        /// Email address.
        #[arg(long)]
        email: String,

        /// Read the password from this environment variable instead of stdin.
        #[arg(long, value_name = "VAR")]
        password_env: Option<String>,
    },

    /// List the stored accounts of an owner.
    Accounts {
        /// Owner whose accounts to list.
        #[arg(long)]
        owner: String,
    },

    /// Print the connection candidates tried for a host.
    Candidates {
        /// Base host, usually the domain of the email address.
        base_host: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_discover_with_overrides() {
        let args = Args::try_parse_from([
            "mailprobe",
            "discover",
            "--owner",
            "alice",
            "--email",
            "alice@example.com",
            "--password-env",
            "MAIL_PASSWORD",
            "--timeout",
            "5",
            "--concurrency",
            "2",
        ])
        .unwrap();

        assert_eq!(args.timeout, Some(5));
        assert_eq!(args.concurrency, Some(2));
        let Command::Discover {
            owner,
            email,
            password_env,
        } = args.command
        else {
            panic!("expected discover");
        };
        assert_eq!(owner, "alice");
        assert_eq!(email, "alice@example.com");
        assert_eq!(password_env.as_deref(), Some("MAIL_PASSWORD"));
    }

    #[test]
    fn test_parse_candidates() {
        let args = Args::try_parse_from(["mailprobe", "candidates", "example.com"]).unwrap();
        assert!(matches!(args.command, Command::Candidates { base_host } if base_host == "example.com"));
    }
}
