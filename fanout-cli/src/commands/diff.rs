//! `fanout diff`: unified diffs between remote files and rendered templates.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use fanout_core::RepoId;
use fanout_store::GitHubClient;
use fanout_sync::diff_repository;
use fanout_templates::TemplateCatalog;

use super::common::{ConfigArgs, RemoteArgs};

/// Arguments for `fanout diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Template tree holding `workflows/` and `actions/`.
    #[arg(long, default_value = "templates")]
    pub templates: PathBuf,

    /// Limit the diff to one repository.
    #[arg(long)]
    pub repo: Option<RepoId>,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let mut repos = self.config.load()?;
        if let Some(only) = self.repo.as_ref() {
            repos.retain(|r| &r.repo == only);
            if repos.is_empty() {
                bail!("{only} is not in {}", self.config.config.display());
            }
        }
        let settings = self.remote.settings(Some(self.templates.clone()), true)?;
        let client = GitHubClient::from_settings(&settings);
        let catalog = TemplateCatalog::from_settings(&settings);

        for desired in &repos {
            let result = diff_repository(&client, &catalog, desired);
            if result.diffs.is_empty() && result.failures.is_empty() {
                println!("No differences for '{}'.", result.repo);
                continue;
            }
            for diff in &result.diffs {
                print!("{}", diff.unified_diff);
                if !diff.unified_diff.ends_with('\n') {
                    println!();
                }
            }
            for (path, reason) in &result.failures {
                eprintln!("{} {}:{path}: {reason}", "error:".red().bold(), result.repo);
            }
        }

        Ok(())
    }
}
