//! In-memory [`ArtifactStore`] that records every call.
//!
//! Behaves like the GitHub store for the decisions the reconciler depends on:
//! updates must carry the current version, creates must target an absent
//! path, secrets are write-only. Failures can be injected per path, per setting
//! name, or per repository.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fanout_core::RepoId;

use crate::error::StoreError;
use crate::types::{
    ArtifactStore, PutContent, RemoteArtifactState, RemoteVariable, RepoPublicKey, SealedSecret,
    VersionToken, WriteKind,
};

/// Key id served by [`MemoryStore::get_public_key`].
pub const MEMORY_KEY_ID: &str = "memory-key";

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetContent { repo: RepoId, path: String, branch: String },
    PutContent {
        repo: RepoId,
        path: String,
        branch: String,
        content: Vec<u8>,
        version: Option<VersionToken>,
    },
    GetPublicKey { repo: RepoId },
    PutSecret { repo: RepoId, name: String, key_id: String },
    GetVariable { repo: RepoId, name: String },
    CreateVariable { repo: RepoId, name: String, value: String },
    UpdateVariable { repo: RepoId, name: String, value: String },
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Call::PutContent { .. }
                | Call::PutSecret { .. }
                | Call::CreateVariable { .. }
                | Call::UpdateVariable { .. }
        )
    }
}

type FileKey = (RepoId, String, String);

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<FileKey, (Vec<u8>, VersionToken)>,
    secrets: BTreeMap<(RepoId, String), SealedSecret>,
    variables: BTreeMap<(RepoId, String), String>,
    public_key: Vec<u8>,
    failing_keys: BTreeSet<String>,
    failing_repos: BTreeSet<RepoId>,
    interleaved: BTreeMap<FileKey, Vec<u8>>,
    calls: Vec<Call>,
    next_version: u64,
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.lock().public_key = vec![9; 32];
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a file at an explicit version.
    pub fn insert_file(
        &self,
        repo: &RepoId,
        branch: &str,
        path: &str,
        content: impl Into<Vec<u8>>,
        version: &str,
    ) {
        self.lock().files.insert(
            (repo.clone(), branch.to_owned(), path.to_owned()),
            (content.into(), VersionToken::from(version)),
        );
    }

    pub fn insert_variable(&self, repo: &RepoId, name: &str, value: &str) {
        self.lock()
            .variables
            .insert((repo.clone(), name.to_owned()), value.to_owned());
    }

    pub fn set_public_key(&self, key: Vec<u8>) {
        self.lock().public_key = key;
    }

    /// Every call touching file path or setting name `key` fails with a
    /// transport error.
    pub fn fail_key(&self, key: &str) {
        self.lock().failing_keys.insert(key.to_owned());
    }

    /// Another writer commits `content` to `path` right before the next
    /// `put_content` for it, so that put sees a version it did not read.
    pub fn interleave_write(
        &self,
        repo: &RepoId,
        branch: &str,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) {
        self.lock().interleaved.insert(
            (repo.clone(), branch.to_owned(), path.to_owned()),
            content.into(),
        );
    }

    /// Every call for `repo` fails with a transport error.
    pub fn fail_repo(&self, repo: &RepoId) {
        self.lock().failing_repos.insert(repo.clone());
    }

    pub fn file(
        &self,
        repo: &RepoId,
        branch: &str,
        path: &str,
    ) -> Option<(Vec<u8>, VersionToken)> {
        self.lock()
            .files
            .get(&(repo.clone(), branch.to_owned(), path.to_owned()))
            .cloned()
    }

    pub fn variable(&self, repo: &RepoId, name: &str) -> Option<String> {
        self.lock()
            .variables
            .get(&(repo.clone(), name.to_owned()))
            .cloned()
    }

    pub fn secret(&self, repo: &RepoId, name: &str) -> Option<SealedSecret> {
        self.lock()
            .secrets
            .get(&(repo.clone(), name.to_owned()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn write_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_write()).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl State {
    fn record(&mut self, call: Call, repo: &RepoId, key: Option<&str>) -> Result<(), StoreError> {
        self.calls.push(call);
        let key_fails = key.is_some_and(|k| self.failing_keys.contains(k));
        if key_fails || self.failing_repos.contains(repo) {
            return Err(StoreError::Transport(format!(
                "injected failure for {repo}{}",
                key.map(|k| format!(":{k}")).unwrap_or_default()
            )));
        }
        Ok(())
    }

    fn bump_version(&mut self) -> VersionToken {
        self.next_version += 1;
        VersionToken(format!("mem-{}", self.next_version))
    }
}

impl ArtifactStore for MemoryStore {
    fn get_content(
        &self,
        repo: &RepoId,
        path: &str,
        branch: &str,
    ) -> Result<RemoteArtifactState, StoreError> {
        let mut state = self.lock();
        state.record(
            Call::GetContent {
                repo: repo.clone(),
                path: path.to_owned(),
                branch: branch.to_owned(),
            },
            repo,
            Some(path),
        )?;
        Ok(
            match state
                .files
                .get(&(repo.clone(), branch.to_owned(), path.to_owned()))
            {
                Some((content, version)) => RemoteArtifactState::Present {
                    content: content.clone(),
                    version: version.clone(),
                },
                None => RemoteArtifactState::Absent,
            },
        )
    }

    fn put_content(
        &self,
        repo: &RepoId,
        path: &str,
        put: &PutContent<'_>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.record(
            Call::PutContent {
                repo: repo.clone(),
                path: path.to_owned(),
                branch: put.branch.to_owned(),
                content: put.content.to_vec(),
                version: put.version.cloned(),
            },
            repo,
            Some(path),
        )?;
        let key = (repo.clone(), put.branch.to_owned(), path.to_owned());
        if let Some(content) = state.interleaved.remove(&key) {
            let version = state.bump_version();
            state.files.insert(key.clone(), (content, version));
        }
        let current = state.files.get(&key).map(|(_, v)| v.clone());
        match (current, put.version) {
            (None, None) => {}
            (Some(current), Some(expected)) if &current == expected => {}
            (Some(current), None) => {
                return Err(StoreError::Conflict {
                    status: 422,
                    message: format!("\"sha\" wasn't supplied; {path} exists at {current}"),
                })
            }
            (current, Some(expected)) => {
                return Err(StoreError::Conflict {
                    status: 409,
                    message: format!(
                        "{path} is at {} but expected {expected}",
                        current.map(|v| v.0).unwrap_or_else(|| "nothing".into())
                    ),
                })
            }
        }
        let version = state.bump_version();
        state.files.insert(key, (put.content.to_vec(), version));
        Ok(())
    }

    fn get_public_key(&self, repo: &RepoId) -> Result<RepoPublicKey, StoreError> {
        let mut state = self.lock();
        state.record(Call::GetPublicKey { repo: repo.clone() }, repo, None)?;
        Ok(RepoPublicKey {
            key_id: MEMORY_KEY_ID.to_owned(),
            key: state.public_key.clone(),
        })
    }

    fn put_secret(
        &self,
        repo: &RepoId,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<WriteKind, StoreError> {
        let mut state = self.lock();
        state.record(
            Call::PutSecret {
                repo: repo.clone(),
                name: name.to_owned(),
                key_id: secret.key_id.clone(),
            },
            repo,
            Some(name),
        )?;
        let previous = state
            .secrets
            .insert((repo.clone(), name.to_owned()), secret.clone());
        Ok(if previous.is_some() {
            WriteKind::Updated
        } else {
            WriteKind::Created
        })
    }

    fn get_variable(
        &self,
        repo: &RepoId,
        name: &str,
    ) -> Result<Option<RemoteVariable>, StoreError> {
        let mut state = self.lock();
        state.record(
            Call::GetVariable {
                repo: repo.clone(),
                name: name.to_owned(),
            },
            repo,
            Some(name),
        )?;
        Ok(state
            .variables
            .get(&(repo.clone(), name.to_owned()))
            .map(|value| RemoteVariable {
                name: name.to_owned(),
                value: value.clone(),
            }))
    }

    fn create_variable(&self, repo: &RepoId, name: &str, value: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.record(
            Call::CreateVariable {
                repo: repo.clone(),
                name: name.to_owned(),
                value: value.to_owned(),
            },
            repo,
            Some(name),
        )?;
        let key = (repo.clone(), name.to_owned());
        if state.variables.contains_key(&key) {
            return Err(StoreError::Conflict {
                status: 409,
                message: format!("variable {name} already exists"),
            });
        }
        state.variables.insert(key, value.to_owned());
        Ok(())
    }

    fn update_variable(&self, repo: &RepoId, name: &str, value: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.record(
            Call::UpdateVariable {
                repo: repo.clone(),
                name: name.to_owned(),
                value: value.to_owned(),
            },
            repo,
            Some(name),
        )?;
        let key = (repo.clone(), name.to_owned());
        match state.variables.get_mut(&key) {
            Some(slot) => {
                *slot = value.to_owned();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                resource: format!("variable {name}"),
            }),
        }
    }
}
