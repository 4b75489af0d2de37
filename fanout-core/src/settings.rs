//! Run settings, built once at process entry and passed down by reference.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore(ci): sync workflow files";
pub const DEFAULT_VARIABLE_NAME: &str = "RUNTIME_TARGET";
/// Key name used by secret distribution when none is given.
pub const DEFAULT_SECRET_NAME: &str = "DEPLOY_TOKEN";
pub const DEFAULT_AUX_DIR: &str = "actions";
pub const DEFAULT_AUX_PREFIX: &str = ".github/actions";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a run needs that is not part of the repository list.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Access token for the remote store.
    pub token: String,
    pub api_url: String,
    /// Applied to every remote call.
    pub timeout: Duration,
    pub commit_message: String,
    /// Variable name under which `runtime_target` is published.
    pub variable_name: String,
    /// Root of the template tree (`workflows/` and the auxiliary directory).
    pub templates_dir: PathBuf,
    /// Auxiliary directory, relative to `templates_dir`.
    pub aux_dir: PathBuf,
    /// Destination prefix for auxiliary files in each repository.
    pub aux_prefix: String,
    pub dry_run: bool,
}

impl Settings {
    /// Settings with defaults for everything but the token.
    ///
    /// Returns `ConfigError::CredentialMissing` for an absent or blank token.
    pub fn new(token: Option<String>) -> Result<Self, ConfigError> {
        let token = token
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::CredentialMissing)?;
        Ok(Self {
            token,
            api_url: DEFAULT_API_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_owned(),
            variable_name: DEFAULT_VARIABLE_NAME.to_owned(),
            templates_dir: PathBuf::from("templates"),
            aux_dir: PathBuf::from(DEFAULT_AUX_DIR),
            aux_prefix: DEFAULT_AUX_PREFIX.to_owned(),
            dry_run: false,
        })
    }
}
