//! Repository list loading.
//!
//! # File shape
//!
//! ```yaml
//! repositories:
//!   - repo: acme/widgets
//!     branch: main
//!     workflows: [ci, release]
//!     runtime_target: ubuntu-latest
//! ```
//!
//! A bare top-level list of entries is accepted too. JSON parses as well,
//! since it is a subset of YAML.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::DesiredRepository;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    repositories: Vec<DesiredRepository>,
}

/// Parse a repository list from YAML text. `origin` is used for error context.
///
/// The document shape decides the form: a sequence is a bare list, a mapping
/// must hold exactly `repositories`. An empty document is an empty list.
pub fn parse(contents: &str, origin: &Path) -> Result<Vec<DesiredRepository>, ConfigError> {
    let parse_err = |source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    };
    let value: serde_yaml::Value = serde_yaml::from_str(contents).map_err(parse_err)?;
    match value {
        serde_yaml::Value::Null => Ok(Vec::new()),
        serde_yaml::Value::Sequence(_) => serde_yaml::from_value(value).map_err(parse_err),
        serde_yaml::Value::Mapping(_) => serde_yaml::from_value::<ConfigDocument>(value)
            .map(|doc| doc.repositories)
            .map_err(parse_err),
        _ => Err(parse_err(serde::de::Error::custom(
            "expected a `repositories:` mapping or a list of entries",
        ))),
    }
}

/// Load the repository list at `path`, preserving declaration order.
///
/// Returns `ConfigError::ConfigurationMissing` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed.
pub fn load(path: &Path) -> Result<Vec<DesiredRepository>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigurationMissing {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, path)
}
