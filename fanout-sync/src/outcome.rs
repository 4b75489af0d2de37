//! Per-artifact outcomes and their per-repository / per-run aggregation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fanout_core::RepoId;

/// Result of reconciling one artifact or setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// Remote already matched; nothing written.
    Unchanged,
    Created,
    Updated,
    /// Dry run: a create would have been issued.
    WouldCreate,
    /// Dry run: an update (or upsert) would have been issued.
    WouldUpdate,
    Failed(String),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// True when a write was issued.
    pub fn wrote(&self) -> bool {
        matches!(self, Outcome::Created | Outcome::Updated)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Unchanged => "unchanged",
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::WouldCreate => "would create",
            Outcome::WouldUpdate => "would update",
            Outcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    File,
    Secret,
    Variable,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::File => write!(f, "file"),
            ArtifactKind::Secret => write!(f, "secret"),
            ArtifactKind::Variable => write!(f, "variable"),
        }
    }
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    pub kind: ArtifactKind,
    /// File path, secret name or variable name.
    pub key: String,
    pub outcome: Outcome,
}

/// Outcomes for one repository, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    #[serde(serialize_with = "serialize_repo")]
    pub repo: RepoId,
    pub branch: String,
    pub artifacts: Vec<ArtifactReport>,
}

fn serialize_repo<S: serde::Serializer>(repo: &RepoId, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(repo)
}

impl RepositoryReport {
    pub fn new(repo: &RepoId, branch: &str) -> Self {
        RepositoryReport {
            repo: repo.clone(),
            branch: branch.to_owned(),
            artifacts: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: ArtifactKind, key: impl Into<String>, outcome: Outcome) {
        self.artifacts.push(ArtifactReport {
            kind,
            key: key.into(),
            outcome,
        });
    }

    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.artifacts.iter().filter(|a| pred(&a.outcome)).count()
    }

    pub fn failed_count(&self) -> usize {
        self.count(Outcome::is_failed)
    }

    /// The outcome recorded for `key`, if any.
    pub fn outcome_of(&self, key: &str) -> Option<&Outcome> {
        self.artifacts
            .iter()
            .find(|a| a.key == key)
            .map(|a| &a.outcome)
    }
}

/// Everything a run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub repositories: Vec<RepositoryReport>,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.repositories.iter().map(RepositoryReport::failed_count).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn artifact_count(&self) -> usize {
        self.repositories.iter().map(|r| r.artifacts.len()).sum()
    }
}
