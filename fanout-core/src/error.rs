//! Error types for fanout-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration or building [`crate::Settings`].
///
/// Every variant is fatal: the run aborts before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The repository list file did not exist at the expected path.
    #[error("configuration not found at {path}")]
    ConfigurationMissing { path: PathBuf },

    /// Underlying I/O failure while reading the configuration.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; carries the file path and line context from serde_yaml.
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A repository identifier was not of the form `owner/name`.
    #[error("invalid repository '{value}'; expected owner/name")]
    InvalidRepository { value: String },

    /// No access token was supplied for the remote store.
    #[error("no access token; pass --token or set GITHUB_TOKEN")]
    CredentialMissing,

    /// Secret distribution was requested without a value to seal.
    #[error("no secret value; set FANOUT_SECRET_VALUE")]
    SecretValueMissing,
}
