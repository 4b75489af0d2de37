//! Error types for fanout-templates.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while resolving or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template file exists for the identifier.
    #[error("no template for workflow '{id}' under {dir}")]
    TemplateNotFound { id: String, dir: PathBuf },

    /// Tera template engine error.
    #[error("template engine error in {path}: {source}")]
    Tera {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] tera::Error),

    /// Filesystem error while reading a template or walking the auxiliary tree.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplateError {
    TemplateError::Io {
        path: path.into(),
        source,
    }
}
