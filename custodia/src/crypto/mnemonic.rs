//! # Recovery Phrases
//!
//! Human-transcribable backup of a 32-byte seed as 25 English words.
//!
//! The encoding packs the seed into 11-bit little-endian chunks over the
//! standard 2048-word English mnemonic list: 24 data words cover the 256
//! seed bits (the final word carries only 3 meaningful bits — the rest
//! must decode to zero), and a 25th checksum word is derived from a
//! SHA-512/256 digest of the seed. The checksum catches the transcription
//! errors humans actually make: a swapped word, a misread word, a word
//! from the wrong line of the backup sheet.
//!
//! This is NOT BIP-39. Same wordlist, different packing and checksum.
//! A phrase from here will not import into a BIP-39 wallet, and vice
//! versa. That's intentional — the seed here IS the key, with no
//! PBKDF2 stretching step in between.

use bip39::Language;
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{MNEMONIC_CHECKSUM_BYTES, MNEMONIC_WORD_COUNT, SEED_LENGTH};

/// Errors raised while parsing or decoding recovery phrases.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    /// The phrase does not contain exactly [`MNEMONIC_WORD_COUNT`] words.
    #[error("invalid word count: expected {MNEMONIC_WORD_COUNT} words, got {got}")]
    InvalidWordCount {
        /// Number of words supplied.
        got: usize,
    },

    /// A word is not in the 2048-word mnemonic list.
    #[error("unknown word: {0:?}")]
    UnknownWord(String),

    /// The 25th word does not match the checksum of the decoded seed.
    #[error("recovery phrase checksum mismatch")]
    ChecksumMismatch,

    /// The data words decode to more than 256 bits of entropy. Indicates
    /// a phrase that was never produced by this encoding.
    #[error("recovery phrase encodes invalid entropy")]
    InvalidEntropy,
}

/// Packs bytes into 11-bit little-endian chunks.
///
/// Bits are consumed least-significant-first within each byte, so the
/// first word holds the low 8 bits of byte 0 plus the low 3 bits of
/// byte 1. The final chunk is zero-padded.
fn bytes_to_words(data: &[u8]) -> Vec<u16> {
    let mut words = Vec::with_capacity((data.len() * 8).div_ceil(11));
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &byte in data {
        buffer |= (byte as u32) << bits;
        bits += 8;
        if bits >= 11 {
            words.push((buffer & 0x7FF) as u16);
            buffer >>= 11;
            bits -= 11;
        }
    }
    if bits > 0 {
        words.push((buffer & 0x7FF) as u16);
    }
    words
}

/// Inverse of [`bytes_to_words`]: unpacks 11-bit chunks back into bytes.
/// Trailing pad bits beyond the byte grid are emitted as a final partial
/// byte, so 24 words yield 33 bytes.
fn words_to_bytes(words: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 11 / 8 + 1);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &word in words {
        buffer |= (word as u32) << bits;
        bits += 11;
        while bits >= 8 {
            bytes.push((buffer & 0xFF) as u8);
            buffer >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        bytes.push((buffer & 0xFF) as u8);
    }
    bytes
}

/// The checksum word: the first 11 bits of SHA-512/256(seed), packed the
/// same little-endian way as the data words.
fn checksum_word(seed: &[u8; SEED_LENGTH]) -> u16 {
    let digest = Sha512_256::digest(seed);
    bytes_to_words(&digest[..MNEMONIC_CHECKSUM_BYTES])[0]
}

/// A 25-word recovery phrase encoding one account seed.
///
/// Construction always goes through validation — any `RecoveryPhrase`
/// value holds exactly 25 known wordlist words, though only
/// [`to_seed`](Self::to_seed) checks the checksum.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveryPhrase {
    words: Vec<&'static str>,
}

impl RecoveryPhrase {
    /// Encodes a seed as a recovery phrase. Infallible: every 32-byte
    /// seed has exactly one phrase.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        let wordlist = Language::English.word_list();
        let mut indexes = bytes_to_words(seed);
        indexes.push(checksum_word(seed));
        debug_assert_eq!(indexes.len(), MNEMONIC_WORD_COUNT);
        let words = indexes
            .into_iter()
            .map(|i| wordlist[i as usize])
            .collect();
        Self { words }
    }

    /// Decodes the phrase back to its seed, verifying the checksum word
    /// and the zero-padding of the final data word.
    pub fn to_seed(&self) -> Result<[u8; SEED_LENGTH], MnemonicError> {
        let indexes = self.word_indexes();
        let (data_words, checksum) = indexes.split_at(MNEMONIC_WORD_COUNT - 1);

        // 24 words carry 264 bits; bits 256..264 are padding and must be
        // zero, otherwise the phrase encodes something bigger than a seed.
        let bytes = words_to_bytes(data_words);
        debug_assert_eq!(bytes.len(), SEED_LENGTH + 1);
        if bytes[SEED_LENGTH] != 0 {
            return Err(MnemonicError::InvalidEntropy);
        }

        let mut seed = [0u8; SEED_LENGTH];
        seed.copy_from_slice(&bytes[..SEED_LENGTH]);

        if checksum_word(&seed) != checksum[0] {
            return Err(MnemonicError::ChecksumMismatch);
        }
        Ok(seed)
    }

    /// The phrase's words in order.
    pub fn words(&self) -> &[&'static str] {
        &self.words
    }

    fn word_indexes(&self) -> Vec<u16> {
        let wordlist = Language::English.word_list();
        self.words
            .iter()
            .map(|w| {
                wordlist
                    .iter()
                    .position(|candidate| candidate == w)
                    .map(|i| i as u16)
                    // Unreachable: construction validates every word.
                    .unwrap_or(0)
            })
            .collect()
    }
}

impl FromStr for RecoveryPhrase {
    type Err = MnemonicError;

    /// Parses a whitespace-separated phrase. Any amount of whitespace
    /// between words is tolerated; case is not — the wordlist is
    /// lowercase and so must the input be.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wordlist = Language::English.word_list();
        let raw: Vec<&str> = s.split_whitespace().collect();
        if raw.len() != MNEMONIC_WORD_COUNT {
            return Err(MnemonicError::InvalidWordCount { got: raw.len() });
        }
        let mut words = Vec::with_capacity(MNEMONIC_WORD_COUNT);
        for word in raw {
            let found = wordlist
                .iter()
                .find(|candidate| **candidate == word)
                .ok_or_else(|| MnemonicError::UnknownWord(word.to_string()))?;
            words.push(*found);
        }
        Ok(Self { words })
    }
}

impl fmt::Display for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}

impl fmt::Debug for RecoveryPhrase {
    /// A recovery phrase IS the private key. Debug output shows only the
    /// word count, never the words.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoveryPhrase({} words)", self.words.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
