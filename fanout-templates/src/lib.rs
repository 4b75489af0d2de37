//! # fanout-templates
//!
//! Resolves workflow-template identifiers and the shared auxiliary tree into
//! [`DesiredArtifact`]s for one repository.
//!
//! ## Layout
//!
//! ```text
//! <templates>/
//!   workflows/
//!     ci.yml              → .github/workflows/ci.yml
//!     release.yml.tera    → .github/workflows/release.yml (rendered)
//!   actions/              → .github/actions/ (path-preserving)
//!     setup/action.yml
//! ```
//!
//! Files ending in `.tera` are rendered with a [`TemplateContext`]; all other
//! files are passed through byte-for-byte.

pub mod catalog;
pub mod context;
pub mod error;

pub use catalog::{workflow_path, ArtifactSource, AuxiliaryFiles, DesiredArtifact, TemplateCatalog};
pub use context::TemplateContext;
pub use error::TemplateError;
