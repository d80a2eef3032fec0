// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use swb_backend_mock::{CatalogEntry, MockBackend};
use swb_core::PackageId;
use swb_daemon::{build_app, AppState};
use swb_policy::AllowListPolicy;
use swb_txndb::TransactionDb;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "swbrokerd", version, about = "System-wide package broker daemon")]
struct Args {
    /// Bind address for the HTTP control surface.
    #[arg(long, default_value = "127.0.0.1:8415")]
    bind: String,

    /// Path to the broker's TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Widen the tracing filter to `debug` for the broker's own crates.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("swb=debug,swb_daemon=debug,swb_transaction=debug")
    } else {
        EnvFilter::new("swb=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = swb_config::load_config(args.config.as_deref()).context("loading broker configuration")?;
    for warning in swb_config::validate_config(&config).context("validating broker configuration")? {
        tracing::warn!(%warning, "configuration warning");
    }

    let txndb = Arc::new(
        TransactionDb::open(config.transaction_db_path.clone())
            .await
            .with_context(|| format!("opening transaction database at {}", config.transaction_db_path))?,
    );

    let backend = Arc::new(MockBackend::new(vec![
        CatalogEntry {
            package_id: PackageId::new("coreutils", "9.4", "x86_64", "fedora")?,
            summary: "core file, shell, and text utilities".into(),
            installed: true,
        },
        CatalogEntry {
            package_id: PackageId::new("htop", "3.3.0", "x86_64", "fedora")?,
            summary: "interactive process viewer".into(),
            installed: false,
        },
        CatalogEntry {
            package_id: PackageId::new("ripgrep", "14.1.0", "x86_64", "fedora")?,
            summary: "line-oriented search tool".into(),
            installed: false,
        },
    ]));

    let policy = Arc::new(AllowListPolicy::new(std::iter::once(0)));

    let state = Arc::new(AppState::new(config, backend, policy, txndb));

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&args.bind).await.with_context(|| format!("bind {}", args.bind))?;
    info!(bind = %args.bind, "swbrokerd listening");

    axum::serve(listener, app).await.context("serve")
}
