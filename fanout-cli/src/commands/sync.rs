//! `fanout sync`: reconcile workflow files and runtime-target variables.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use fanout_store::GitHubClient;
use fanout_sync::{Driver, Reconciler};
use fanout_templates::TemplateCatalog;

use super::common::{ConfigArgs, RemoteArgs};
use super::report;

/// Arguments for `fanout sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Template tree holding `workflows/` and `actions/`.
    #[arg(long, default_value = "templates")]
    pub templates: PathBuf,

    /// Read remote state and report what would be written, without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON instead of the streaming summary.
    #[arg(long)]
    pub json: bool,

    /// Exit 0 even when some artifacts failed.
    #[arg(long)]
    pub allow_failures: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<ExitCode> {
        let repos = self.config.load()?;
        let settings = self.remote.settings(Some(self.templates.clone()), self.dry_run)?;

        tracing::debug!(repositories = repos.len(), dry_run = settings.dry_run, "starting sync");
        let client = GitHubClient::from_settings(&settings);
        let catalog = TemplateCatalog::from_settings(&settings);
        let reconciler =
            Reconciler::new(&client, &settings.commit_message).dry_run(settings.dry_run);
        let driver = Driver::new(reconciler, &catalog, &settings.variable_name);

        let json = self.json;
        let run = driver.sync_all_with(&repos, |repo| {
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
