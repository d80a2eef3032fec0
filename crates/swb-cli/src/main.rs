// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde_json::json;
use swb_cli::client::ClientError;
use swb_cli::{BrokerClient, ExitCode};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "swb", version, about = "Console client for the package broker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the daemon's control surface.
    #[arg(long, default_value = "http://127.0.0.1:8415", global = true)]
    daemon_url: String,

    /// Caller uid to present to the daemon (defaults to the real uid).
    #[arg(long, global = true)]
    uid: Option<u32>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve package names to package-ids.
    Resolve {
        /// Package names.
        names: Vec<String>,
    },
    /// Search installed and available packages by name.
    SearchName {
        /// Search terms.
        terms: Vec<String>,
    },
    /// List packages with a pending update.
    GetUpdates,
    /// List packages matching the default filter set.
    GetPackages,
    /// Install one or more remote packages.
    Install {
        /// Package-id wire strings (`name;version;arch;data`).
        package_ids: Vec<String>,
    },
    /// Remove one or more installed packages.
    Remove {
        /// Package-id wire strings.
        package_ids: Vec<String>,
        /// Also remove packages that become unneeded.
        #[arg(long)]
        autoremove: bool,
    },
    /// Update one or more installed packages.
    Update {
        /// Package-id wire strings.
        package_ids: Vec<String>,
    },
    /// Refresh repository metadata.
    RefreshCache {
        /// Force a refresh even if the cache is still fresh.
        #[arg(long)]
        force: bool,
    },
    /// List configured repositories.
    RepoList,
    /// Cancel a running transaction by tid.
    Cancel {
        /// The tid path returned by an earlier call.
        tid: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // `--help`/`--version` surface as an `Err` too; let clap print and
        // exit 0 for those exactly as it normally would. Anything else is
        // a genuinely malformed invocation (spec §6.7 exit code 3), not
        // the "daemon died mid-transaction" clap's own default code 2
        // would otherwise be confused with.
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(ExitCode::SyntaxInvalid.into())
            }
        },
    };

    let filter = if cli.debug { EnvFilter::new("swb=debug") } else { EnvFilter::new("swb=info") };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let code = run(cli).await;
    std::process::exit(code.into());
}

async fn run(cli: Cli) -> ExitCode {
    let uid = cli.uid.unwrap_or_else(current_uid);
    let client = BrokerClient::new(cli.daemon_url);

    let (role, body) = match &cli.command {
        Commands::Resolve { names } => ("resolve", json!({ "filters": 0, "search_terms": names })),
        Commands::SearchName { terms } => ("search-name", json!({ "filters": 0, "search_terms": terms })),
        Commands::GetUpdates => ("get-updates", json!({ "filters": 0 })),
        Commands::GetPackages => ("get-packages", json!({ "filters": 0 })),
        Commands::Install { package_ids } => ("install-packages", json!({ "tx_flags": 0, "package_ids": package_ids })),
        Commands::Remove { package_ids, autoremove } => {
            ("remove-packages", json!({ "tx_flags": 0, "package_ids": package_ids, "autoremove": autoremove }))
        }
        Commands::Update { package_ids } => ("update-packages", json!({ "tx_flags": 0, "package_ids": package_ids })),
        Commands::RefreshCache { force } => ("refresh-cache", json!({ "force": force })),
        Commands::RepoList => ("get-repo-list", json!({ "filters": 0 })),
        Commands::Cancel { tid } => {
            return match client.cancel(tid).await {
                Ok(()) => ExitCode::Success,
                Err(e) => report_client_error(&e),
            };
        }
    };

    match run_role(&client, role, uid, &body).await {
        Ok(exit) => exit,
        Err(e) => report_client_error(&e),
    }
}

async fn run_role(client: &BrokerClient, role: &str, uid: u32, body: &serde_json::Value) -> Result<ExitCode, ClientError> {
    let tid = client.get_tid(role, uid).await?;
    client.set_hints(&tid, &[]).await?;
    client.submit(&tid, role, body).await?;
    let snapshot = client.wait_for_finish(&tid, Duration::from_millis(200)).await?;

    if let Some((code, details)) = &snapshot.error {
        eprintln!("error: {code}: {details}");
    }
    println!("{}: {}", role, snapshot.exit.as_deref().unwrap_or("unknown"));

    Ok(match snapshot.exit.as_deref() {
        Some("success") => ExitCode::Success,
        Some("cancelled") => ExitCode::Success,
        _ => ExitCode::GenericFailure,
    })
}

fn report_client_error(e: &ClientError) -> ExitCode {
    eprintln!("error: {e}");
    match e {
        ClientError::Unreachable(..) => ExitCode::DaemonDied,
        ClientError::Daemon { status: 404, .. } => ExitCode::SyntaxInvalid,
        ClientError::Daemon { .. } => ExitCode::GenericFailure,
    }
}

fn current_uid() -> u32 {
    std::env::var("SUDO_UID").ok().and_then(|s| s.parse().ok()).unwrap_or(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_uid_falls_back_without_sudo_uid() {
        std::env::remove_var("SUDO_UID");
        assert_eq!(current_uid(), 1000);
    }
}
