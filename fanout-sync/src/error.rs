//! Error types for fanout-sync.

use thiserror::Error;

use fanout_store::{SealError, StoreError};
use fanout_templates::TemplateError;

/// Why a single artifact or setting could not be reconciled.
///
/// Never escapes the artifact boundary: the reconciler turns it into
/// [`crate::Outcome::Failed`].
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}
