//! fanout: keep workflow files, secrets and variables in sync across
//! GitHub repositories.
//!
//! # Usage
//!
//! ```text
//! fanout sync   [--config repos.yaml] [--templates templates] [--dry-run] [--json]
//!               [--allow-failures]
//! fanout secret [--config repos.yaml] [--name NAME]      # value from $FANOUT_SECRET_VALUE
//! fanout diff   [--config repos.yaml] [--templates templates] [--repo owner/name]
//! fanout list   [--config repos.yaml]
//! ```
//!
//! The access token comes from `--token` or `$GITHUB_TOKEN`.

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, list::ListArgs, secret::SecretArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fanout",
    version,
    about = "Sync workflow files, secrets and variables across GitHub repositories",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile workflow files and the runtime-target variable.
    Sync(SyncArgs),

    /// Seal one secret and write it into every configured repository.
    Secret(SecretArgs),

    /// Show unified diffs of what sync would write. Never writes.
    Diff(DiffArgs),

    /// Print the configured repositories.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Secret(args) => args.run(),
        Commands::Diff(args) => args.run().map(|()| ExitCode::SUCCESS),
        Commands::List(args) => args.run().map(|()| ExitCode::SUCCESS),
    }
}

/// Diagnostics go to stderr so stdout stays a clean report.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
