//! Flags shared by several subcommands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use fanout_core::settings::{DEFAULT_API_URL, DEFAULT_COMMIT_MESSAGE, DEFAULT_VARIABLE_NAME};
use fanout_core::{config, DesiredRepository, Settings};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Repository list (YAML or JSON).
    #[arg(long, short, default_value = "repos.yaml")]
    pub config: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<Vec<DesiredRepository>> {
        config::load(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))
    }
}

#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// GitHub access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API.
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Timeout for each remote call, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Commit message for file writes.
    #[arg(long, default_value = DEFAULT_COMMIT_MESSAGE)]
    pub commit_message: String,

    /// Repository variable that receives `runtime_target`.
    #[arg(long, default_value = DEFAULT_VARIABLE_NAME)]
    pub variable_name: String,
}

impl RemoteArgs {
    /// Fails with `CredentialMissing` before anything touches the network.
    pub fn settings(&self, templates_dir: Option<PathBuf>, dry_run: bool) -> Result<Settings> {
        let mut settings = Settings::new(self.token.clone())?;
        settings.api_url = self.api_url.trim_end_matches('/').to_owned();
        settings.timeout = Duration::from_secs(self.timeout_secs);
        settings.commit_message = self.commit_message.clone();
        settings.variable_name = self.variable_name.clone();
        if let Some(dir) = templates_dir {
            settings.templates_dir = dir;
        }
        settings.dry_run = dry_run;
        Ok(settings)
    }
}
