//! fanout core library: domain types, config loading, run settings, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes and desired-state structs
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load the repository list
//! - [`settings`]: [`Settings`] built once at process entry

pub mod config;
pub mod error;
pub mod settings;
pub mod types;

pub use error::ConfigError;
pub use settings::Settings;
pub use types::{DesiredRepository, RepoId, DEFAULT_BRANCH};
