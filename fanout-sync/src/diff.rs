//! Read-only unified diffs for `fanout diff`.

use similar::TextDiff;

use fanout_core::DesiredRepository;
use fanout_store::{ArtifactStore, RemoteArtifactState};
use fanout_templates::ArtifactSource;

use crate::driver::for_each_desired_file;

/// A single remote-vs-desired file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    /// True when the file does not exist remotely yet.
    pub new_file: bool,
    pub unified_diff: String,
}

/// Diff result for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDiff {
    pub repo: String,
    pub diffs: Vec<FileDiff>,
    /// (path, reason) for files that could not be read or resolved.
    pub failures: Vec<(String, String)>,
}

/// Compare every desired file of `desired` against the store. Nothing is written.
pub fn diff_repository<S, A>(store: &S, source: &A, desired: &DesiredRepository) -> RepositoryDiff
where
    S: ArtifactStore + ?Sized,
    A: ArtifactSource + ?Sized,
{
    let mut diffs = Vec::new();
    let mut failures = Vec::new();

    for_each_desired_file(source, desired, |key, item| {
        let artifact = match item {
            Ok(artifact) => artifact,
            Err(err) => {
                failures.push((key, err.to_string()));
                return;
            }
        };
        let (existing, new_file) =
            match store.get_content(&desired.repo, &artifact.path, &desired.branch) {
                Ok(RemoteArtifactState::Present { content, .. }) => (content, false),
                Ok(RemoteArtifactState::Absent) => (Vec::new(), true),
                Err(err) => {
                    failures.push((key, err.to_string()));
                    return;
                }
            };
        if existing == artifact.content {
            return;
        }

        let old = String::from_utf8_lossy(&existing);
        let new = String::from_utf8_lossy(&artifact.content);
        let old_header = if new_file {
            "/dev/null".to_owned()
        } else {
            format!("a/{}", artifact.path)
        };
        let new_header = format!("b/{}", artifact.path);
        let unified = TextDiff::from_lines(old.as_ref(), new.as_ref())
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(FileDiff {
            path: artifact.path,
            new_file,
            unified_diff: unified,
        });
    });

    RepositoryDiff {
        repo: desired.repo.to_string(),
        diffs,
        failures,
    }
}
