//! # Addresses
//!
//! Bech32m-encoded public identities. A Custodia address is 32 raw bytes
//! wearing a human-readable prefix and a checksum — nothing more.
//!
//! Two flavors exist, and the type system keeps them apart:
//!
//! - [`SigningAddress`] (`cda1...`) — an Ed25519 verifying key, or the
//!   digest of a multisig group definition. This is "the" account address
//!   that appears as a transaction sender or receiver.
//! - [`EncryptionAddress`] (`cdx1...`) — an X25519 public key used for
//!   sealed-box encryption, derived from the same seed as the signing key.
//!
//! Pasting one where the other is expected fails at parse time thanks to
//! the distinct prefixes. That's the whole point.
//!
//! ## A note on multisig addresses
//!
//! A [`SigningAddress`] is *not* guaranteed to be a valid curve point —
//! multisig group addresses are SHA-512/256 digests. Signature verification
//! therefore parses the verifying key lazily and simply answers `false`
//! when the bytes don't land on the curve.

use bech32::{Bech32m, Hrp};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ADDRESS_LENGTH, ENCRYPTION_ADDRESS_HRP, SIGNING_ADDRESS_HRP};

/// Errors raised while parsing or constructing addresses.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The string is not valid bech32m (bad charset, bad checksum, etc.).
    #[error("malformed address: not valid bech32m")]
    MalformedAddress,

    /// The human-readable prefix does not match the expected address kind.
    #[error("wrong address prefix: expected {expected:?}, got {got:?}")]
    WrongPrefix {
        /// The prefix required for this address kind.
        expected: &'static str,
        /// The prefix actually present.
        got: String,
    },

    /// The decoded payload is not exactly [`ADDRESS_LENGTH`] bytes.
    #[error("invalid address payload length: expected {ADDRESS_LENGTH} bytes, got {got}")]
    InvalidLength {
        /// Actual payload length.
        got: usize,
    },
}

fn encode_bech32(hrp: &'static str, bytes: &[u8; ADDRESS_LENGTH]) -> String {
    // Both inputs are fixed and known-valid: the HRP is a compile-time
    // constant and the payload is always 32 bytes, well under the bech32m
    // length limit. Encoding cannot fail for this shape of input.
    let hrp = Hrp::parse_unchecked(hrp);
    bech32::encode::<Bech32m>(hrp, bytes).unwrap_or_default()
}

fn decode_bech32(
    expected_hrp: &'static str,
    s: &str,
) -> Result<[u8; ADDRESS_LENGTH], AddressError> {
    let (hrp, data) = bech32::decode(s).map_err(|_| AddressError::MalformedAddress)?;
    if hrp.as_str() != expected_hrp {
        return Err(AddressError::WrongPrefix {
            expected: expected_hrp,
            got: hrp.as_str().to_string(),
        });
    }
    let bytes: [u8; ADDRESS_LENGTH] = data
        .as_slice()
        .try_into()
        .map_err(|_| AddressError::InvalidLength { got: data.len() })?;
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// SigningAddress
// ---------------------------------------------------------------------------

/// The public signing identity of an account.
///
/// For an ordinary account this is the Ed25519 verifying key; for a
/// multisig account it is the group definition digest. Either way it is
/// the address a transaction declares as its sender.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SigningAddress([u8; ADDRESS_LENGTH]);

impl SigningAddress {
    /// Wraps raw 32-byte address material.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Validates length and wraps a byte slice.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; ADDRESS_LENGTH] = slice
            .try_into()
            .map_err(|_| AddressError::InvalidLength { got: slice.len() })?;
        Ok(Self(bytes))
    }

    /// Returns the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for SigningAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_bech32(SIGNING_ADDRESS_HRP, &self.0))
    }
}

impl fmt::Debug for SigningAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_string();
        // Prefix plus a recognizable chunk; full addresses drown log lines.
        write!(f, "SigningAddress({}..)", &s[..s.len().min(16)])
    }
}

impl FromStr for SigningAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_bech32(SIGNING_ADDRESS_HRP, s).map(Self)
    }
}

impl Serialize for SigningAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SigningAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

// ---------------------------------------------------------------------------
// EncryptionAddress
// ---------------------------------------------------------------------------

/// The public encryption identity of an account — an X25519 public key
/// derived from the same seed as the signing key.
///
/// Safe to publish. Anyone holding it can seal messages that only the
/// account's private key can open.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncryptionAddress([u8; ADDRESS_LENGTH]);

impl EncryptionAddress {
    /// Wraps raw 32-byte X25519 public key material.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Validates length and wraps a byte slice.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; ADDRESS_LENGTH] = slice
            .try_into()
            .map_err(|_| AddressError::InvalidLength { got: slice.len() })?;
        Ok(Self(bytes))
    }

    /// Returns the raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Converts to an `x25519-dalek` public key for Diffie-Hellman.
    pub fn to_public_key(&self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(self.0)
    }
}

impl fmt::Display for EncryptionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_bech32(ENCRYPTION_ADDRESS_HRP, &self.0))
    }
}

impl fmt::Debug for EncryptionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_string();
        write!(f, "EncryptionAddress({}..)", &s[..s.len().min(16)])
    }
}

impl FromStr for EncryptionAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_bech32(ENCRYPTION_ADDRESS_HRP, s).map(Self)
    }
}

impl Serialize for EncryptionAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EncryptionAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
