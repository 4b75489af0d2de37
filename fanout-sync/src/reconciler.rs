//! Single-artifact reconciliation.
//!
//! ## Files: read, compare, write
//!
//! 1. Read the path on the branch.
//! 2. Present and byte-equal → `Unchanged`, no write.
//! 3. Present and different → update carrying the version just read.
//! 4. Absent → create without a version.
//!
//! An update never uses a version that was not observed by the read in the
//! same call. Every remote call is attempted once; errors become
//! [`Outcome::Failed`] for that artifact only.
//!
//! ## Secrets: always upsert
//!
//! The store cannot return secret values, so there is no unchanged check.
//!
//! ## Variables: presence decides create vs update
//!
//! An existing variable is rewritten even when its value already matches.

use fanout_core::RepoId;
use fanout_store::{
    seal_secret, ArtifactStore, PutContent, RemoteArtifactState, Sealer, WriteKind,
};

use crate::error::ReconcileError;
use crate::outcome::Outcome;

/// Reconciles one artifact at a time against an [`ArtifactStore`].
pub struct Reconciler<'a, S: ArtifactStore + ?Sized> {
    store: &'a S,
    commit_message: &'a str,
    dry_run: bool,
}

impl<'a, S: ArtifactStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S, commit_message: &'a str) -> Self {
        Reconciler {
            store,
            commit_message,
            dry_run: false,
        }
    }

    /// In dry-run mode reads happen but no write is issued.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    pub fn reconcile_file(
        &self,
        repo: &RepoId,
        branch: &str,
        path: &str,
        desired: &[u8],
    ) -> Outcome {
        self.try_reconcile_file(repo, branch, path, desired)
            .unwrap_or_else(|err| {
                tracing::warn!(%repo, path, error = %err, "file reconciliation failed");
                Outcome::Failed(err.to_string())
            })
    }

    fn try_reconcile_file(
        &self,
        repo: &RepoId,
        branch: &str,
        path: &str,
        desired: &[u8],
    ) -> Result<Outcome, ReconcileError> {
        let version = match self.store.get_content(repo, path, branch)? {
            RemoteArtifactState::Present { content, .. } if content == desired => {
                tracing::debug!(%repo, path, "unchanged");
                return Ok(Outcome::Unchanged);
            }
            RemoteArtifactState::Present { version, .. } => Some(version),
            RemoteArtifactState::Absent => None,
        };

        if self.dry_run {
            tracing::info!(%repo, path, "[dry-run] would write");
            return Ok(match version {
                Some(_) => Outcome::WouldUpdate,
                None => Outcome::WouldCreate,
            });
        }

        let put = PutContent {
            content: desired,
            message: self.commit_message,
            branch,
            version: version.as_ref(),
        };
        self.store.put_content(repo, path, &put)?;
        Ok(match version {
            Some(version) => {
                tracing::info!(%repo, path, %version, "updated");
                Outcome::Updated
            }
            None => {
                tracing::info!(%repo, path, "created");
                Outcome::Created
            }
        })
    }

    // -----------------------------------------------------------------------
    // Secrets
    // -----------------------------------------------------------------------

    pub fn reconcile_secret(
        &self,
        sealer: &(impl Sealer + ?Sized),
        repo: &RepoId,
        key: &str,
        plaintext: &str,
    ) -> Outcome {
        self.try_reconcile_secret(sealer, repo, key, plaintext)
            .unwrap_or_else(|err| {
                tracing::warn!(%repo, key, error = %err, "secret reconciliation failed");
                Outcome::Failed(err.to_string())
            })
    }

    fn try_reconcile_secret(
        &self,
        sealer: &(impl Sealer + ?Sized),
        repo: &RepoId,
        key: &str,
        plaintext: &str,
    ) -> Result<Outcome, ReconcileError> {
        let public_key = self.store.get_public_key(repo)?;
        let sealed = seal_secret(sealer, &public_key, plaintext.as_bytes())?;
        if self.dry_run {
            tracing::info!(%repo, key, "[dry-run] would write secret");
            return Ok(Outcome::WouldUpdate);
        }
        let outcome = match self.store.put_secret(repo, key, &sealed)? {
            WriteKind::Created => Outcome::Created,
            WriteKind::Updated => Outcome::Updated,
        };
        tracing::info!(%repo, key, key_id = %sealed.key_id, "secret {}", outcome.label());
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------------

    pub fn reconcile_variable(&self, repo: &RepoId, key: &str, value: &str) -> Outcome {
        self.try_reconcile_variable(repo, key, value)
            .unwrap_or_else(|err| {
                tracing::warn!(%repo, key, error = %err, "variable reconciliation failed");
                Outcome::Failed(err.to_string())
            })
    }

    fn try_reconcile_variable(
        &self,
        repo: &RepoId,
        key: &str,
        value: &str,
    ) -> Result<Outcome, ReconcileError> {
        let exists = self.store.get_variable(repo, key)?.is_some();
        if self.dry_run {
            return Ok(if exists {
                Outcome::WouldUpdate
            } else {
                Outcome::WouldCreate
            });
        }
        if exists {
            self.store.update_variable(repo, key, value)?;
            tracing::info!(%repo, key, "variable updated");
            Ok(Outcome::Updated)
        } else {
            self.store.create_variable(repo, key, value)?;
            tracing::info!(%repo, key, "variable created");
            Ok(Outcome::Created)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
