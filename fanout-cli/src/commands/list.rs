//! `fanout list`: print the configured repositories. Needs no token.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::common::ConfigArgs;

/// Arguments for `fanout list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled, Serialize)]
struct RepositoryRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "workflows")]
    workflows: String,
    #[tabled(rename = "runtime target")]
    runtime_target: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let repos = self.config.load()?;
        let rows: Vec<RepositoryRow> = repos
            .into_iter()
            .map(|r| RepositoryRow {
                repository: r.repo.to_string(),
                branch: r.branch,
                workflows: r.workflows.join(", "),
                runtime_target: r.runtime_target.unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize repository list")?
            );
            return Ok(());
        }

        if rows.is_empty() {
            println!("No repositories configured.");
            return Ok(());
        }
        println!("{} repositories", rows.len());
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
