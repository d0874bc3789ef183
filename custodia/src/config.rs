//! # Protocol Configuration & Constants
//!
//! Every magic number in Custodia lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong and you owe the team
//! coffee.
//!
//! Several of these values feed address derivation and checksum encodings.
//! Changing them invalidates every address and recovery phrase ever
//! produced by this library, so treat them as frozen.

// ---------------------------------------------------------------------------
// Key Material
// ---------------------------------------------------------------------------

/// Ed25519 — the only sane choice for signatures in 2024+.
/// Deterministic, fast, and nobody has broken it.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Length of an Ed25519 seed (the private scalar) in bytes.
pub const SEED_LENGTH: usize = 32;

/// Length of an Ed25519 verifying (public) key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

/// Raw byte length of the exported key pair blob: seed followed by the
/// derived verifying key. The embedded verifying key doubles as an
/// integrity check when the blob is re-imported.
pub const KEY_PAIR_BLOB_LENGTH: usize = SEED_LENGTH + PUBLIC_KEY_LENGTH;

/// Character length of the hex-encoded key pair blob accepted by
/// `KeyPair::from_encoded_string`.
pub const ENCODED_KEY_PAIR_LENGTH: usize = KEY_PAIR_BLOB_LENGTH * 2;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Bech32m human-readable prefix for signing addresses.
pub const SIGNING_ADDRESS_HRP: &str = "cda";

/// Bech32m human-readable prefix for encryption addresses.
///
/// A separate prefix keeps the two key roles visually and programmatically
/// distinct — pasting an encryption address where a signing address is
/// expected fails to parse instead of silently misrouting funds.
pub const ENCRYPTION_ADDRESS_HRP: &str = "cdx";

/// Raw payload length of every Custodia address, in bytes.
pub const ADDRESS_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Recovery Phrases
// ---------------------------------------------------------------------------

/// Number of words in a recovery phrase: 24 data words covering the
/// 256-bit seed in 11-bit chunks, plus 1 checksum word.
pub const MNEMONIC_WORD_COUNT: usize = 25;

/// Size of the mnemonic wordlist. 2^11 — each word encodes 11 bits.
pub const WORDLIST_SIZE: usize = 2048;

/// Number of checksum digest bytes folded into the 25th word.
pub const MNEMONIC_CHECKSUM_BYTES: usize = 2;

// ---------------------------------------------------------------------------
// Multisig
// ---------------------------------------------------------------------------

/// Current multisig account version. Feeds the group address derivation,
/// so bumping it changes every group address.
pub const MULTISIG_VERSION: u8 = 1;

/// Domain-separation tag prefixed to the multisig address digest input.
pub const MULTISIG_DOMAIN_TAG: &[u8] = b"CustodiaMsig";

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Domain-separation tag prefixed to a transaction's canonical signable
/// bytes. Signatures over transactions can never be replayed as signatures
/// over arbitrary messages, and vice versa.
pub const TXN_DOMAIN_TAG: &[u8] = b"CTX";

/// Domain-separation tag for atomic transaction group id computation.
pub const TXN_GROUP_DOMAIN_TAG: &[u8] = b"CTG";

/// Maximum number of transactions in an atomic group.
pub const MAX_TXN_GROUP_SIZE: usize = 16;

// ---------------------------------------------------------------------------
// Sealed Boxes (authenticated encryption)
// ---------------------------------------------------------------------------

/// BLAKE3 `derive_key` context for sealed-box session keys. The raw X25519
/// shared secret is never used as an encryption key directly — it has
/// algebraic structure, and AEAD keys must be uniformly random.
pub const SEALED_BOX_CONTEXT: &str = "custodia 2026-02-11 sealed box v1";

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. 96 bits is the standard and the only
/// length you should use. 12 bytes. Not 16. Not 8. Twelve.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Library protocol version, reported by the CLI `version` command.
pub const PROTOCOL_VERSION: &str = "0.1.0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_covers_seed_plus_checksum() {
        // 32 bytes = 256 bits. ceil(256 / 11) = 24 data words, 1 checksum.
        let data_words = (SEED_LENGTH * 8).div_ceil(11);
        assert_eq!(data_words + 1, MNEMONIC_WORD_COUNT);
    }

    #[test]
    fn encoded_blob_lengths_are_consistent() {
        assert_eq!(KEY_PAIR_BLOB_LENGTH, 64);
        assert_eq!(ENCODED_KEY_PAIR_LENGTH, 128);
    }
}
