//! Template context: the serializable rendering payload built from a
//! [`DesiredRepository`].

use serde::{Deserialize, Serialize};

use fanout_core::DesiredRepository;

use crate::error::TemplateError;

/// Values available to `.tera` templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    /// `owner/name`.
    pub repository: String,
    pub owner: String,
    pub name: String,
    pub branch: String,
    pub workflows: Vec<String>,
    pub runtime_target: Option<String>,
    /// Name of the repository variable carrying `runtime_target`.
    pub variable_name: String,
    pub fanout_version: String,
}

impl TemplateContext {
    /// Build a [`TemplateContext`] for one repository entry.
    pub fn from_repository(repo: &DesiredRepository, variable_name: &str) -> Self {
        TemplateContext {
            repository: repo.repo.to_string(),
            owner: repo.repo.owner.clone(),
            name: repo.repo.name.clone(),
            branch: repo.branch.clone(),
            workflows: repo.workflows.clone(),
            runtime_target: repo.runtime_target.clone(),
            variable_name: variable_name.to_owned(),
            fanout_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, TemplateError> {
        tera::Context::from_serialize(self).map_err(TemplateError::from)
    }
}
