//! Template catalog: [`ArtifactSource`] trait and the on-disk [`TemplateCatalog`].
//!
//! # Path mapping
//!
//! | Source                                    | Destination                        |
//! |-------------------------------------------|------------------------------------|
//! | `<templates>/workflows/<id>.yml`          | `.github/workflows/<id>.yml`       |
//! | `<templates>/workflows/<id>.yml.tera`     | `.github/workflows/<id>.yml`       |
//! | `<templates>/<aux_dir>/<rel>`             | `<aux_prefix>/<rel>`               |

use std::path::{Path, PathBuf};

use tera::Tera;
use walkdir::WalkDir;

use fanout_core::{DesiredRepository, Settings};

use crate::context::TemplateContext;
use crate::error::{io_err, TemplateError};

const TERA_SUFFIX: &str = ".tera";

/// A file that should exist in a repository with exactly this content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredArtifact {
    /// `/`-separated path relative to the repository root.
    pub path: String,
    pub content: Vec<u8>,
}

/// Destination path of the template file for a workflow identifier.
pub fn workflow_path(id: &str) -> String {
    format!(".github/workflows/{id}.yml")
}

// ---------------------------------------------------------------------------
// ArtifactSource
// ---------------------------------------------------------------------------

/// Produces the desired files for a repository.
///
/// `auxiliary` returns a fresh, finite sequence on every call, in a
/// deterministic order.
pub trait ArtifactSource {
    /// The single template file for `id`.
    fn workflow(
        &self,
        repo: &DesiredRepository,
        id: &str,
    ) -> Result<DesiredArtifact, TemplateError>;

    /// The shared auxiliary files.
    fn auxiliary<'a>(
        &'a self,
        repo: &'a DesiredRepository,
    ) -> Box<dyn Iterator<Item = Result<DesiredArtifact, TemplateError>> + 'a>;
}

// ---------------------------------------------------------------------------
// TemplateCatalog
// ---------------------------------------------------------------------------

/// Reads templates from a directory tree on disk.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    root: PathBuf,
    aux_root: PathBuf,
    aux_prefix: String,
    variable_name: String,
}

impl TemplateCatalog {
    pub fn new(
        root: impl Into<PathBuf>,
        aux_dir: impl AsRef<Path>,
        aux_prefix: impl Into<String>,
        variable_name: impl Into<String>,
    ) -> Self {
        let root = root.into();
        let aux_root = root.join(aux_dir);
        TemplateCatalog {
            root,
            aux_root,
            aux_prefix: aux_prefix.into(),
            variable_name: variable_name.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.templates_dir,
            &settings.aux_dir,
            &settings.aux_prefix,
            &settings.variable_name,
        )
    }

    pub fn workflows_dir(&self) -> PathBuf {
        self.root.join("workflows")
    }

    fn context(&self, repo: &DesiredRepository) -> TemplateContext {
        TemplateContext::from_repository(repo, &self.variable_name)
    }

    /// Locate the source file for `id`: plain `.yml` first, then `.yml.tera`.
    fn locate(&self, id: &str) -> Option<PathBuf> {
        let dir = self.workflows_dir();
        [format!("{id}.yml"), format!("{id}.yml{TERA_SUFFIX}")]
            .into_iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }

    /// Walk the auxiliary tree lazily. Each call starts a new walk.
    pub fn auxiliary_files(&self, repo: &DesiredRepository) -> AuxiliaryFiles<'_> {
        let walker = self
            .aux_root
            .is_dir()
            .then(|| WalkDir::new(&self.aux_root).sort_by_file_name().into_iter());
        AuxiliaryFiles {
            walker,
            root: &self.aux_root,
            prefix: self.aux_prefix.trim_end_matches('/'),
            ctx: self.context(repo),
        }
    }
}

impl ArtifactSource for TemplateCatalog {
    fn workflow(
        &self,
        repo: &DesiredRepository,
        id: &str,
    ) -> Result<DesiredArtifact, TemplateError> {
        let source = self.locate(id).ok_or_else(|| TemplateError::TemplateNotFound {
            id: id.to_owned(),
            dir: self.workflows_dir(),
        })?;
        Ok(DesiredArtifact {
            path: workflow_path(id),
            content: load(&source, &self.context(repo))?,
        })
    }

    fn auxiliary<'a>(
        &'a self,
        repo: &'a DesiredRepository,
    ) -> Box<dyn Iterator<Item = Result<DesiredArtifact, TemplateError>> + 'a> {
        Box::new(self.auxiliary_files(repo))
    }
}

// ---------------------------------------------------------------------------
// AuxiliaryFiles
// ---------------------------------------------------------------------------

/// Lazy walk over the auxiliary tree in lexical path order.
///
/// Yields nothing when the auxiliary directory does not exist.
pub struct AuxiliaryFiles<'a> {
    walker: Option<walkdir::IntoIter>,
    root: &'a Path,
    prefix: &'a str,
    ctx: TemplateContext,
}

impl Iterator for AuxiliaryFiles<'_> {
    type Item = Result<DesiredArtifact, TemplateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.as_mut()?.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(self.root).to_path_buf();
                    return Some(Err(io_err(path, err.into())));
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let rel = path.strip_prefix(self.root).unwrap_or(path);
            let dest = format!("{}/{}", self.prefix, destination_name(rel));
            return Some(load(path, &self.ctx).map(|content| DesiredArtifact {
                path: dest,
                content,
            }));
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_tera(path: &Path) -> bool {
    path.to_string_lossy().ends_with(TERA_SUFFIX)
}

/// `/`-joined relative path with a trailing `.tera` removed.
fn destination_name(rel: &Path) -> String {
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    match joined.strip_suffix(TERA_SUFFIX) {
        Some(stripped) => stripped.to_owned(),
        None => joined,
    }
}

/// Read a template file; render it when it carries the `.tera` suffix.
fn load(path: &Path, ctx: &TemplateContext) -> Result<Vec<u8>, TemplateError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    if !is_tera(path) {
        return Ok(bytes);
    }
    let source = String::from_utf8(bytes).map_err(|e| {
        io_err(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    let tera_ctx = ctx.to_tera_context()?;
    let rendered = Tera::one_off(&source, &tera_ctx, false).map_err(|source| {
        TemplateError::Tera {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(rendered.into_bytes())
}
