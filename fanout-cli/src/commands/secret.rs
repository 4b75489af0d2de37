//! `fanout secret`: seal one value and write it into every repository.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use fanout_core::settings::DEFAULT_SECRET_NAME;
use fanout_core::ConfigError;
use fanout_store::{GitHubClient, SealedBox};
use fanout_sync::{distribute_secret, Reconciler};

use super::common::{ConfigArgs, RemoteArgs};
use super::report;

/// Environment variable holding the plaintext secret.
const SECRET_VALUE_ENV: &str = "FANOUT_SECRET_VALUE";

/// Arguments for `fanout secret`.
#[derive(Args, Debug)]
pub struct SecretArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Secret name written in each repository.
    #[arg(long, default_value = DEFAULT_SECRET_NAME)]
    pub name: String,

    /// Fetch keys and seal, but do not write.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Exit 0 even when some repositories failed.
    #[arg(long)]
    pub allow_failures: bool,
}

impl SecretArgs {
    pub fn run(self) -> Result<ExitCode> {
        let repos = self.config.load()?;
        let settings = self.remote.settings(None, self.dry_run)?;
        let value = std::env::var(SECRET_VALUE_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::SecretValueMissing)?;

        tracing::debug!(repositories = repos.len(), name = %self.name, "distributing secret");
        let client = GitHubClient::from_settings(&settings);
        let reconciler =
            Reconciler::new(&client, &settings.commit_message).dry_run(settings.dry_run);

        let json = self.json;
        let run = distribute_secret(&reconciler, &SealedBox, &repos, &self.name, &value, |repo| {
            if !json {
                report::print_repository(repo, settings.dry_run);
            }
        });

        if json {
            report::print_json(&run)?;
        } else {
            report::print_summary(&run);
        }
        Ok(report::exit_code(&run, self.allow_failures))
    }
}
