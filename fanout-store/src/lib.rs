//! # fanout-store
//!
//! The remote artifact store as a capability: the [`ArtifactStore`] trait,
//! its GitHub REST implementation ([`GitHubClient`]), an in-memory
//! implementation for tests and rehearsals ([`MemoryStore`]), and the
//! sealed-box [`Sealer`] used for secrets.

pub mod crypto;
pub mod error;
pub mod github;
pub mod memory;
pub mod types;

pub use crypto::{seal_secret, SealedBox, Sealer};
pub use error::{SealError, StoreError};
pub use github::GitHubClient;
pub use memory::{Call, MemoryStore};
pub use types::{
    ArtifactStore, PutContent, RemoteArtifactState, RemoteVariable, RepoPublicKey, SealedSecret,
    VersionToken, WriteKind,
};
