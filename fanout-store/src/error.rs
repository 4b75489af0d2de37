//! Error types for fanout-store.

use thiserror::Error;

/// Failures reported by an [`crate::ArtifactStore`].
///
/// "Absent" is not an error for reads that have an absent variant
/// ([`crate::RemoteArtifactState::Absent`], `None` variables); `NotFound`
/// only surfaces from calls that require the resource to exist.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The resource a call depends on does not exist.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Version mismatch or create-over-existing.
    #[error("conflict (HTTP {status}): {message}")]
    Conflict { status: u16, message: String },

    /// Any other non-2xx response.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Network-level failure (DNS, TLS, timeout, connection reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("malformed {what} response: {message}")]
    Parse { what: &'static str, message: String },
}

/// Failures while sealing a secret.
#[derive(Debug, Error)]
pub enum SealError {
    #[error("public key is not valid base64: {0}")]
    KeyEncoding(#[from] base64::DecodeError),

    #[error("public key must be {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    #[error("sealed-box encryption failed")]
    Seal,
}
