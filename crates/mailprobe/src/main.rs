//! `mailprobe` - discover working IMAP connection settings from the command line.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Args, Command};
use mailprobe_core::discovery::candidates;
use mailprobe_core::{
    AccountStore, Discovery, DiscoveryOutcome, DnsMxResolver, DomainClassifier, ImapProber,
    OwnerId, Settings, SqliteAccountStore, StoreError,
};

/// Exit code when no candidate worked.
const EXIT_NOT_FOUND: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "mailprobe=debug,mailprobe_core=debug,mailprobe_imap=debug"
    } else {
        "mailprobe=info,mailprobe_core=info,mailprobe_imap=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let settings = load_settings(&args).await?;

    match args.command {
        Command::Discover {
            owner,
            email,
            password_env,
        } => discover(&settings, OwnerId::new(owner), &email, password_env).await,
        Command::Accounts { owner } => list_accounts(&settings, &OwnerId::new(owner)).await,
        Command::Candidates { base_host } => {
            for candidate in candidates(&base_host) {
                println!(
                    "{}:{} {}",
                    candidate.host, candidate.port, candidate.security
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads the settings file and applies command-line overrides.
async fn load_settings(args: &Args) -> Result<Settings> {
    let path = args.settings.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&path)
        .await
        .with_context(|| format!("loading settings from {}", path.display()))?;

    if let Some(database) = &args.database {
        settings.database_path = Some(database.clone());
    }
    if let Some(timeout) = args.timeout {
        settings.probe_timeout_secs = timeout;
    }
    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency;
    }

    Ok(settings.validate()?)
}

/// Opens the account database, creating its directory if needed.
async fn open_store(settings: &Settings) -> Result<SqliteAccountStore> {
    let db_path = settings.database_path();
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let db_path = db_path
        .to_str()
        .context("database path is not valid UTF-8")?;

    SqliteAccountStore::new(db_path, settings.password_storage)
        .await
        .with_context(|| format!("opening account database {db_path}"))
}

async fn discover(
    settings: &Settings,
    owner: OwnerId,
    email: &str,
    password_env: Option<String>,
) -> Result<ExitCode> {
    let password = read_password(password_env.as_deref()).await?;

    let classifier = DomainClassifier::with_rules(
        DnsMxResolver::new(settings.dns_timeout(), settings.dns_attempts),
        settings.providers.clone(),
    );
    let discovery = Discovery::new(
        classifier,
        ImapProber::new(settings.probe_timeout()),
        open_store(settings).await?,
    )
    .concurrency(settings.concurrency)
    .overall_deadline(settings.overall_deadline());

    info!(
        email,
        worst_case = ?discovery.worst_case_latency(),
        "probing connection settings"
    );

    match discovery.discover(&owner, email, &password).await? {
        DiscoveryOutcome::Found(account) => {
            println!(
                "found: {}:{} ({}), user {}, stored as account {}",
                account.inbound_host,
                account.inbound_port,
                account.inbound_security.display_name(),
                account.inbound_user,
                account.id
            );
            Ok(ExitCode::SUCCESS)
        }
        DiscoveryOutcome::NotFound => {
            println!("not found: no working IMAP settings for {email}, configure manually");
            Ok(ExitCode::from(EXIT_NOT_FOUND))
        }
    }
}

async fn list_accounts(settings: &Settings, owner: &OwnerId) -> Result<ExitCode> {
    let store = open_store(settings).await?;

    match store.find_all_for(owner).await {
        Ok(accounts) => {
            for account in accounts {
                println!(
                    "{}\t{}\t{}:{}\t{}",
                    account.id,
                    account.email,
                    account.inbound_host,
                    account.inbound_port,
                    account.inbound_security
                );
            }
        }
        Err(StoreError::NotFound(_)) => println!("no accounts"),
        Err(e) => return Err(e).context("listing accounts"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Reads the password from `env_var`, or else the first line of stdin.
async fn read_password(env_var: Option<&str>) -> Result<String> {
    if let Some(var) = env_var {
        return std::env::var(var).with_context(|| format!("reading password from ${var}"));
    }

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("reading password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("no password given on stdin");
    }
    Ok(password.to_string())
}
