//! Human-readable run output.

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use fanout_sync::{Outcome, RepositoryReport, RunReport};

/// Exit code for a run that finished with failed artifacts.
pub const PARTIAL_FAILURE: u8 = 2;

pub fn print_repository(report: &RepositoryReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let failed = report.failed_count();
    let written = report.count(|o| {
        o.wrote() || matches!(o, Outcome::WouldCreate | Outcome::WouldUpdate)
    });
    let unchanged = report.count(|o| *o == Outcome::Unchanged);

    let mark = if failed > 0 { "✗".red() } else { "✓".green() };
    if report.artifacts.is_empty() {
        println!("{prefix}{mark} {} ({}): nothing to do", report.repo, report.branch);
        return;
    }
    println!(
        "{prefix}{mark} {} ({}): {written} written, {unchanged} unchanged, {failed} failed",
        report.repo, report.branch
    );

    for artifact in &report.artifacts {
        let marker = match &artifact.outcome {
            Outcome::Created | Outcome::Updated => "✎".normal(),
            Outcome::WouldCreate | Outcome::WouldUpdate => "~".yellow(),
            Outcome::Unchanged => "·".bright_black(),
            Outcome::Failed(_) => "✗".red(),
        };
        println!(
            "  {marker}  {:<8} {}  {}",
            artifact.kind.to_string(),
            artifact.key,
            artifact.outcome
        );
    }
}

pub fn print_summary(run: &RunReport) {
    let failed = run.failed_count();
    let line = format!(
        "{} repositories, {} artifacts, {failed} failed",
        run.repositories.len(),
        run.artifact_count()
    );
    if failed > 0 {
        println!("{}", line.red().bold());
    } else {
        println!("{}", line.bold());
    }
}

pub fn print_json(run: &RunReport) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(run).context("failed to serialize run report")?
    );
    Ok(())
}

pub fn exit_code(run: &RunReport, allow_failures: bool) -> ExitCode {
    if run.is_success() || allow_failures {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(PARTIAL_FAILURE)
    }
}
