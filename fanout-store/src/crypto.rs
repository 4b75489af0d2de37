//! Sealed-box encryption for repository secrets.
//!
//! Anonymous sender, recipient-only decryption: an ephemeral X25519 key pair
//! is generated per call and discarded after sealing.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use crypto_box::{aead::OsRng, PublicKey, KEY_SIZE};

use crate::error::SealError;
use crate::types::{RepoPublicKey, SealedSecret};

/// Seals a plaintext under a recipient public key.
pub trait Sealer {
    fn seal(&self, recipient_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SealError>;
}

/// libsodium-compatible `crypto_box_seal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SealedBox;

impl Sealer for SealedBox {
    fn seal(&self, recipient_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
        let bytes: [u8; KEY_SIZE] =
            recipient_key
                .try_into()
                .map_err(|_| SealError::KeyLength {
                    expected: KEY_SIZE,
                    actual: recipient_key.len(),
                })?;
        PublicKey::from(bytes)
            .seal(&mut OsRng, plaintext)
            .map_err(|_| SealError::Seal)
    }
}

/// Seal `plaintext` for `key` and package it with the key id.
pub fn seal_secret(
    sealer: &(impl Sealer + ?Sized),
    key: &RepoPublicKey,
    plaintext: &[u8],
) -> Result<SealedSecret, SealError> {
    let sealed = sealer.seal(&key.key, plaintext)?;
    Ok(SealedSecret {
        encrypted_value: STANDARD.encode(sealed),
        key_id: key.key_id.clone(),
    })
}

/// Decode a base64 public key as served by the store.
pub fn decode_public_key(encoded: &str) -> Result<Vec<u8>, SealError> {
    Ok(STANDARD.decode(encoded.trim())?)
}
