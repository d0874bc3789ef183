//! # Key Material
//!
//! A [`KeyPair`] is the atomic unit of custody: one 32-byte Ed25519 seed
//! from which both the account's signing capability and its sealed-box
//! encryption capability are derived.
//!
//! ## Why one seed for two jobs?
//!
//! Custodians hold one secret per account. Deriving the X25519 encryption
//! key from the Ed25519 seed (via the standard SHA-512 birational map
//! conversion) means a single backup — one recovery phrase — restores
//! everything the account can do. This mirrors how NaCl-era wallets
//! handled it, and it composes: the same seed signs transactions and opens
//! private messages.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - We use OS-level RNG (`OsRng`) for key generation. If your OS RNG is
//!   broken, you have bigger problems than Custodia.
//! - Key bytes are never logged. If you add logging to this module, you
//!   will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fmt;
use thiserror::Error;
use x25519_dalek::StaticSecret;

use crate::config::{
    ENCODED_KEY_PAIR_LENGTH, KEY_PAIR_BLOB_LENGTH, SEED_LENGTH, SIGNATURE_LENGTH,
};
use crate::crypto::address::{EncryptionAddress, SigningAddress};
use crate::crypto::mnemonic::{MnemonicError, RecoveryPhrase};
use crate::crypto::sealed::{self, SealedBoxError};

/// Errors that can occur during key construction and verification.
///
/// These carry lengths, not key material. Leaking secrets through error
/// messages is a classic footgun and we're not going to be the ones who
/// step on it.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The supplied seed material is too short to yield a full seed.
    /// Longer inputs are fine — only the first [`SEED_LENGTH`] bytes are
    /// used — but short inputs are never zero-padded.
    #[error("invalid key length: expected at least {expected} bytes, got {got}")]
    InvalidKeyLength {
        /// Minimum acceptable input length.
        expected: usize,
        /// Actual input length.
        got: usize,
    },

    /// The encoded key string does not decode to a seed-plus-public-key
    /// blob of the documented length.
    #[error("invalid encoded key: expected {ENCODED_KEY_PAIR_LENGTH} hex characters")]
    InvalidEncoding,

    /// The public key embedded in an encoded blob does not match the one
    /// derived from its seed. The blob is corrupt or hand-assembled.
    #[error("encoded public key does not match the seed-derived public key")]
    KeyMismatch,

    /// Signature bytes could not be parsed into the fixed 64-byte format.
    /// Distinct from a *wrong* signature, which verifies to `false`.
    #[error("malformed signature: expected {expected} bytes, got {got}")]
    MalformedSignature {
        /// Required signature length.
        expected: usize,
        /// Actual length supplied.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// An Ed25519 signature over a message.
///
/// 64 bytes. Deterministic for a given (key, message) pair — no nonce
/// management, no k-value disasters, no sleepless nights wondering if your
/// RNG was seeded properly during signing.
///
/// Stored as `Vec<u8>` for serde compatibility, but always exactly 64
/// bytes when produced by this library.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    /// Wraps a raw 64-byte signature.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature string. 128 characters for a valid signature.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parses a hex-encoded signature, enforcing the fixed length.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::MalformedSignature {
            expected: SIGNATURE_LENGTH,
            got: s.len() / 2,
        })?;
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(KeyError::MalformedSignature {
                expected: SIGNATURE_LENGTH,
                got: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 16 {
            write!(f, "Signature({}..)", &hex_str[..16])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// Both public addresses derived from one seed, bundled for convenience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAddresses {
    /// The account's signing (transaction) address.
    pub signing: SigningAddress,
    /// The account's sealed-box encryption address.
    pub encryption: EncryptionAddress,
}

/// An account's private key material: signing and encryption in one.
///
/// The `SigningKey` is the crown jewel — guard it with your life, or at
/// least with a proper key-custody store (see the `keystore` module).
///
/// ## Serialization
///
/// `KeyPair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Exporting private keys should be a deliberate, conscious act, not
/// something that happens because someone shoved a keypair into a JSON
/// response. Use [`to_encoded_string`](Self::to_encoded_string) or
/// [`to_recovery_phrase`](Self::to_recovery_phrase) explicitly.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generates a fresh keypair from the OS cryptographic RNG.
    ///
    /// Collision probability between independently generated seeds is
    /// cryptographically negligible — we accept the randomness source and
    /// do not check for duplicates at runtime.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Constructs a keypair from raw seed material of flexible length.
    ///
    /// Exactly [`SEED_LENGTH`] bytes are used as-is; longer input is
    /// truncated to its first [`SEED_LENGTH`] bytes (the exported blob
    /// form appends the public key, so truncation accepts it directly).
    /// Shorter input is an error — never implicit zero-padding, which
    /// would silently produce a weak key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() < SEED_LENGTH {
            return Err(KeyError::InvalidKeyLength {
                expected: SEED_LENGTH,
                got: bytes.len(),
            });
        }
        let mut seed = [0u8; SEED_LENGTH];
        seed.copy_from_slice(&bytes[..SEED_LENGTH]);
        Ok(Self::from_seed(&seed))
    }

    /// Decodes the hex-encoded export form: `hex(seed || verifying_key)`,
    /// 128 characters.
    ///
    /// The embedded verifying key is checked against the one derived from
    /// the seed, so a corrupted or spliced blob is rejected instead of
    /// quietly yielding a different account.
    pub fn from_encoded_string(s: &str) -> Result<Self, KeyError> {
        let blob = hex::decode(s).map_err(|_| KeyError::InvalidEncoding)?;
        if blob.len() != KEY_PAIR_BLOB_LENGTH {
            return Err(KeyError::InvalidEncoding);
        }
        let keypair = Self::from_bytes(&blob)?;
        if keypair.signing_key.verifying_key().as_bytes() != &blob[SEED_LENGTH..] {
            return Err(KeyError::KeyMismatch);
        }
        Ok(keypair)
    }

    /// Exports the keypair as `hex(seed || verifying_key)`.
    ///
    /// **Handle with extreme care.** Don't log it. Don't send it over the
    /// network in plaintext. Don't store it in a text file called
    /// `my_keys.txt` on your desktop.
    pub fn to_encoded_string(&self) -> String {
        let mut blob = Vec::with_capacity(KEY_PAIR_BLOB_LENGTH);
        blob.extend_from_slice(&self.signing_key.to_bytes());
        blob.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        hex::encode(blob)
    }

    /// Reconstructs a keypair from a 25-word recovery phrase.
    pub fn from_recovery_phrase(phrase: &RecoveryPhrase) -> Result<Self, MnemonicError> {
        let seed = phrase.to_seed()?;
        Ok(Self::from_seed(&seed))
    }

    /// Encodes the seed as a 25-word recovery phrase for backup.
    pub fn to_recovery_phrase(&self) -> RecoveryPhrase {
        RecoveryPhrase::from_seed(&self.signing_key.to_bytes())
    }

    /// Returns the raw 32-byte seed. Same warnings as
    /// [`to_encoded_string`](Self::to_encoded_string) apply.
    pub fn seed(&self) -> [u8; SEED_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// The account's signing address — the Ed25519 verifying key in
    /// bech32m clothes.
    pub fn signing_address(&self) -> SigningAddress {
        SigningAddress::from_bytes(self.signing_key.verifying_key().to_bytes())
    }

    /// The account's encryption address — the X25519 public key derived
    /// from the same seed.
    pub fn encryption_address(&self) -> EncryptionAddress {
        let secret = self.x25519_secret();
        let public = x25519_dalek::PublicKey::from(&secret);
        EncryptionAddress::from_bytes(*public.as_bytes())
    }

    /// Both public addresses in one bundle.
    pub fn public_addresses(&self) -> PublicAddresses {
        PublicAddresses {
            signing: self.signing_address(),
            encryption: self.encryption_address(),
        }
    }

    /// Signs a message. Deterministic — the same (seed, message) pair
    /// always produces the same signature (RFC 8032).
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig = self.signing_key.sign(message);
        Signature::from_bytes(sig.to_bytes())
    }

    /// Seals a message for `recipient` so that only the recipient's
    /// private key (knowing this sender's encryption address) can open it.
    ///
    /// Self-encryption is permitted: sealing to your own encryption
    /// address round-trips.
    pub fn encrypt(
        &self,
        message: &[u8],
        recipient: &EncryptionAddress,
    ) -> Result<Vec<u8>, SealedBoxError> {
        sealed::seal(&self.x25519_secret(), &recipient.to_public_key(), message)
    }

    /// Opens a sealed message produced by `sender` for this keypair.
    pub fn decrypt(
        &self,
        sealed_message: &[u8],
        sender: &EncryptionAddress,
    ) -> Result<Vec<u8>, SealedBoxError> {
        sealed::open(&self.x25519_secret(), &sender.to_public_key(), sealed_message)
    }

    /// Derives the X25519 static secret from the Ed25519 seed.
    ///
    /// Standard NaCl-style conversion: the secret scalar is the first 32
    /// bytes of SHA-512(seed); x25519-dalek applies the curve clamping
    /// during the Diffie-Hellman computation.
    fn x25519_secret(&self) -> StaticSecret {
        let digest = Sha512::digest(self.signing_key.to_bytes());
        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&digest[..32]);
        StaticSecret::from(scalar)
    }
}

impl Clone for KeyPair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material in debug output. Not even "partially."
        write!(f, "KeyPair({:?})", self.signing_address())
    }
}

impl PartialEq for KeyPair {
    /// Two keypairs are equal if their public keys match. Comparing secret
    /// material in a non-constant-time way is a bad habit, and for
    /// identity purposes the public key is what matters.
    fn eq(&self, other: &Self) -> bool {
        self.signing_key.verifying_key() == other.signing_key.verifying_key()
    }
}

impl Eq for KeyPair {}

// ---------------------------------------------------------------------------
// Verification on SigningAddress
// ---------------------------------------------------------------------------

impl SigningAddress {
    /// Verifies a signature against this address.
    ///
    /// Returns `false` for a structurally valid but mismatched signature,
    /// and also when this address is not a valid Ed25519 point (multisig
    /// group addresses are digests — nothing can verify against them
    /// directly). Most callers want a yes/no answer, not a failure mode
    /// taxonomy.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(self.as_bytes()) else {
            return false;
        };
        let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.as_bytes().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let dalek_sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Verifies raw signature bytes, distinguishing "wrong signature"
    /// (`Ok(false)`) from "not even a signature"
    /// ([`KeyError::MalformedSignature`]).
    pub fn verify_bytes(&self, message: &[u8], signature: &[u8]) -> Result<bool, KeyError> {
        let sig_bytes: [u8; SIGNATURE_LENGTH] =
            signature
                .try_into()
                .map_err(|_| KeyError::MalformedSignature {
                    expected: SIGNATURE_LENGTH,
                    got: signature.len(),
                })?;
        Ok(self.verify(message, &Signature::from_bytes(sig_bytes)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
