//! # fanout-sync
//!
//! Reconciliation of remote repository state against the desired state.
//!
//! Use a [`Reconciler`] for single artifacts, or a [`Driver`] to process a
//! whole repository list in declaration order. Per-artifact failures become
//! [`Outcome::Failed`] and never stop sibling artifacts or repositories.

pub mod diff;
pub mod driver;
pub mod error;
pub mod outcome;
pub mod reconciler;

pub use diff::{diff_repository, FileDiff, RepositoryDiff};
pub use driver::{distribute_secret, Driver};
pub use error::ReconcileError;
pub use outcome::{ArtifactKind, ArtifactReport, Outcome, RepositoryReport, RunReport};
pub use reconciler::Reconciler;
