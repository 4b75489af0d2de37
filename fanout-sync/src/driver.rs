//! Batch driver: repositories in declaration order, one artifact at a time.
//!
//! Per repository:
//! 1. runtime-target variable (when declared)
//! 2. for each workflow identifier, its template file; the shared auxiliary
//!    tree follows the first template
//!
//! Each step has its own failure scope. A path is reconciled at most once
//! per repository. Secret distribution ([`distribute_secret`]) runs outside
//! the driver since it needs no templates.

use std::collections::BTreeSet;

use chrono::Utc;

use fanout_core::DesiredRepository;
use fanout_store::{ArtifactStore, Sealer};
use fanout_templates::{workflow_path, ArtifactSource, DesiredArtifact, TemplateError};

use crate::outcome::{ArtifactKind, Outcome, RepositoryReport, RunReport};
use crate::reconciler::Reconciler;

/// Drives a [`Reconciler`] over a repository list.
pub struct Driver<'a, S: ArtifactStore + ?Sized, A: ArtifactSource + ?Sized> {
    reconciler: Reconciler<'a, S>,
    source: &'a A,
    variable_name: &'a str,
}

impl<'a, S: ArtifactStore + ?Sized, A: ArtifactSource + ?Sized> Driver<'a, S, A> {
    pub fn new(reconciler: Reconciler<'a, S>, source: &'a A, variable_name: &'a str) -> Self {
        Driver {
            reconciler,
            source,
            variable_name,
        }
    }

    /// Reconcile the runtime-target variable and every file of one repository.
    pub fn sync_repository(&self, desired: &DesiredRepository) -> RepositoryReport {
        let repo = &desired.repo;
        let mut report = RepositoryReport::new(repo, &desired.branch);
        tracing::debug!(%repo, branch = %desired.branch, "syncing repository");

        if let Some(target) = desired.runtime_target.as_deref() {
            let outcome = self
                .reconciler
                .reconcile_variable(repo, self.variable_name, target);
            report.push(ArtifactKind::Variable, self.variable_name, outcome);
        }

        for_each_desired_file(self.source, desired, |key, item| {
            let outcome = match item {
                Ok(artifact) => self.reconciler.reconcile_file(
                    repo,
                    &desired.branch,
                    &artifact.path,
                    &artifact.content,
                ),
                Err(err) => {
                    tracing::warn!(%repo, path = %key, error = %err, "template unavailable");
                    Outcome::Failed(err.to_string())
                }
            };
            report.push(ArtifactKind::File, key, outcome);
        });

        report
    }

    pub fn sync_all(&self, repos: &[DesiredRepository]) -> RunReport {
        self.sync_all_with(repos, |_| {})
    }

    /// Like [`Driver::sync_all`], calling `on_repository` as each repository finishes.
    pub fn sync_all_with(
        &self,
        repos: &[DesiredRepository],
        mut on_repository: impl FnMut(&RepositoryReport),
    ) -> RunReport {
        let started_at = Utc::now();
        let mut repositories = Vec::with_capacity(repos.len());
        for desired in repos {
            let report = self.sync_repository(desired);
            on_repository(&report);
            repositories.push(report);
        }
        RunReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.reconciler.is_dry_run(),
            repositories,
        }
    }
}

/// Seal and write secret `name` into every repository, in declaration order.
///
/// Only the store is touched; templates play no part.
pub fn distribute_secret<S: ArtifactStore + ?Sized>(
    reconciler: &Reconciler<'_, S>,
    sealer: &(impl Sealer + ?Sized),
    repos: &[DesiredRepository],
    name: &str,
    value: &str,
    mut on_repository: impl FnMut(&RepositoryReport),
) -> RunReport {
    let started_at = Utc::now();
    let mut repositories = Vec::with_capacity(repos.len());
    for desired in repos {
        let mut report = RepositoryReport::new(&desired.repo, &desired.branch);
        let outcome = reconciler.reconcile_secret(sealer, &desired.repo, name, value);
        report.push(ArtifactKind::Secret, name, outcome);
        on_repository(&report);
        repositories.push(report);
    }
    RunReport {
        started_at,
        finished_at: Utc::now(),
        dry_run: reconciler.is_dry_run(),
        repositories,
    }
}

/// Visit every desired file of a repository once, in reconciliation order.
///
/// `visit` receives the destination path (or the failing source path) and the
/// resolved artifact.
pub(crate) fn for_each_desired_file<A: ArtifactSource + ?Sized>(
    source: &A,
    desired: &DesiredRepository,
    mut visit: impl FnMut(String, Result<DesiredArtifact, TemplateError>),
) {
    let mut seen = BTreeSet::new();
    let mut once = |key: String, item: Result<DesiredArtifact, TemplateError>| {
        if seen.insert(key.clone()) {
            visit(key, item);
        }
    };

    for (index, id) in desired.workflows.iter().enumerate() {
        once(workflow_path(id), source.workflow(desired, id));
        if index == 0 {
            for item in source.auxiliary(desired) {
                let key = match &item {
                    Ok(artifact) => artifact.path.clone(),
                    Err(err) => error_key(err),
                };
                once(key, item);
            }
        }
    }
}

fn error_key(err: &TemplateError) -> String {
    match err {
        TemplateError::Io { path, .. } | TemplateError::Tera { path, .. } => {
            path.display().to_string()
        }
        TemplateError::TemplateNotFound { id, .. } => workflow_path(id),
        TemplateError::Serialization(_) => "<auxiliary>".to_owned(),
    }
}
