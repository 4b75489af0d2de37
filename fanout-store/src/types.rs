//! Store capability trait and the values that cross it.

use std::fmt;

use fanout_core::RepoId;

use crate::error::StoreError;

/// Opaque revision identifier of a stored file (a blob SHA on GitHub).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(pub String);

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// What the store holds at a (repository, path, branch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteArtifactState {
    Absent,
    Present {
        /// Decoded bytes, transport encoding already removed.
        content: Vec<u8>,
        version: VersionToken,
    },
}

/// A file write. `version: None` creates; `Some` updates that revision.
#[derive(Debug, Clone, Copy)]
pub struct PutContent<'a> {
    pub content: &'a [u8],
    pub message: &'a str,
    pub branch: &'a str,
    pub version: Option<&'a VersionToken>,
}

/// A repository's secret-encryption key, already base64-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPublicKey {
    pub key_id: String,
    pub key: Vec<u8>,
}

/// A sealed secret value ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    /// Base64 of the sealed box.
    pub encrypted_value: String,
    pub key_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVariable {
    pub name: String,
    pub value: String,
}

/// Whether an upsert created a new entry or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Created,
    Updated,
}

/// The remote artifact store as seen by the reconciler.
///
/// Every method is a single remote call; implementations never retry.
pub trait ArtifactStore {
    fn get_content(
        &self,
        repo: &RepoId,
        path: &str,
        branch: &str,
    ) -> Result<RemoteArtifactState, StoreError>;

    fn put_content(
        &self,
        repo: &RepoId,
        path: &str,
        put: &PutContent<'_>,
    ) -> Result<(), StoreError>;

    fn get_public_key(&self, repo: &RepoId) -> Result<RepoPublicKey, StoreError>;

    /// Always an upsert; secrets cannot be read back.
    fn put_secret(
        &self,
        repo: &RepoId,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<WriteKind, StoreError>;

    fn get_variable(&self, repo: &RepoId, name: &str)
        -> Result<Option<RemoteVariable>, StoreError>;

    fn create_variable(&self, repo: &RepoId, name: &str, value: &str) -> Result<(), StoreError>;

    fn update_variable(&self, repo: &RepoId, name: &str, value: &str) -> Result<(), StoreError>;
}
