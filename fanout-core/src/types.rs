//! Domain types for the desired repository state.
//!
//! All types are deserializable via serde + serde_yaml and immutable for the
//! duration of a run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Branch used when a repository entry does not name one.
pub const DEFAULT_BRANCH: &str = "main";

// ---------------------------------------------------------------------------
// RepoId
// ---------------------------------------------------------------------------

/// A GitHub repository identity, written `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRepository {
            value: s.to_owned(),
        };
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(owner, name))
    }
}

impl Serialize for RepoId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// DesiredRepository
// ---------------------------------------------------------------------------

fn default_branch() -> String {
    DEFAULT_BRANCH.to_owned()
}

/// One entry of the repository list: what a single repository should hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesiredRepository {
    pub repo: RepoId,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Workflow-template identifiers, deployed in this order.
    #[serde(default)]
    pub workflows: Vec<String>,
    /// Published as a repository variable when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_target: Option<String>,
}

impl DesiredRepository {
    /// An entry on the default branch with no workflows and no runtime target.
    pub fn new(repo: RepoId) -> Self {
        Self {
            repo,
            branch: default_branch(),
            workflows: Vec::new(),
            runtime_target: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
