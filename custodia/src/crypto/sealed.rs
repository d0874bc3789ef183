//! # Sealed Boxes
//!
//! Authenticated public-key encryption between two accounts.
//!
//! The construction is the classic one: X25519 Diffie-Hellman to agree on
//! a shared secret, a KDF to turn that secret into a uniformly random AEAD
//! key, and AES-256-GCM to encrypt-and-authenticate the payload. The wire
//! format is `nonce || ciphertext` with the GCM tag appended to the
//! ciphertext, so a sealed box is always `12 + len(plaintext) + 16` bytes.
//!
//! Tampering with any byte — nonce, ciphertext, or tag — fails the open
//! with [`SealedBoxError::DecryptionFailed`] and nothing else. AEAD errors
//! are deliberately opaque: distinguishing "bad tag" from "bad key" hands
//! an attacker an oracle.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::config::{AES_NONCE_LENGTH, AES_TAG_LENGTH, SEALED_BOX_CONTEXT};

/// Errors raised while sealing or opening boxes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SealedBoxError {
    /// AEAD encryption failed. In practice this only happens for inputs
    /// exceeding the AES-GCM length limits, which no sane payload hits.
    #[error("encryption failed")]
    EncryptFailed,

    /// The sealed box did not authenticate: wrong key, wrong sender, or a
    /// modified ciphertext. One error for all of them, on purpose.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The input is too short to even contain a nonce and a tag.
    #[error("sealed box too short: {got} bytes, minimum {min}")]
    CiphertextTooShort {
        /// Length of the supplied input.
        got: usize,
        /// Minimum structurally valid length.
        min: usize,
    },
}

/// Derives the AEAD session key for a (secret, peer) pair.
///
/// The raw DH output has algebraic structure and must never be used as a
/// cipher key directly. BLAKE3's `derive_key` mode gives us domain
/// separation and uniformity in one call.
fn session_key(secret: &StaticSecret, peer: &PublicKey) -> Result<Aes256Gcm, SealedBoxError> {
    let shared = secret.diffie_hellman(peer);
    // Reject the all-zero shared secret produced by small-order peer
    // points. A contributory check, same as NaCl does.
    if !shared.was_contributory() {
        return Err(SealedBoxError::DecryptionFailed);
    }
    let key = blake3::derive_key(SEALED_BOX_CONTEXT, shared.as_bytes());
    Ok(Aes256Gcm::new((&key).into()))
}

/// Seals `plaintext` from the holder of `secret` to `recipient`.
///
/// Output layout: `nonce(12) || ciphertext || tag(16)`. A fresh random
/// nonce is drawn per call, so sealing the same message twice yields
/// different boxes.
pub fn seal(
    secret: &StaticSecret,
    recipient: &PublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>, SealedBoxError> {
    let cipher = session_key(secret, recipient).map_err(|_| SealedBoxError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| SealedBoxError::EncryptFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Opens a sealed box produced by `sender` for the holder of `secret`.
pub fn open(
    secret: &StaticSecret,
    sender: &PublicKey,
    sealed: &[u8],
) -> Result<Vec<u8>, SealedBoxError> {
    let min = AES_NONCE_LENGTH + AES_TAG_LENGTH;
    if sealed.len() < min {
        return Err(SealedBoxError::CiphertextTooShort {
            got: sealed.len(),
            min,
        });
    }

    let cipher = session_key(secret, sender)?;
    let (nonce_bytes, ciphertext) = sealed.split_at(AES_NONCE_LENGTH);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| SealedBoxError::DecryptionFailed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
