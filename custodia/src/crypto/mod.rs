//! # Cryptographic Primitives for Custodia
//!
//! Everything security-related in the signing engine flows through here.
//! Key derivation, addresses, recovery phrases, sealed boxes — this module
//! is where the curves live.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — fast, deterministic, and nobody has broken it.
//! - **X25519** for key exchange — same curve, different clothes.
//! - **AES-256-GCM** for sealed-box payloads — AEAD done right.
//! - **BLAKE3** for key derivation — because we live in the future.
//! - **SHA-512/256** for address digests and checksums — stable and boring.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again. Then go read about timing attacks
//! and come back when you've lost the urge.

pub mod address;
pub mod keys;
pub mod mnemonic;
pub mod sealed;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy. Life's too short for five levels of `use` statements.
pub use address::{AddressError, EncryptionAddress, SigningAddress};
pub use keys::{KeyError, KeyPair, PublicAddresses, Signature};
pub use mnemonic::{MnemonicError, RecoveryPhrase};
pub use sealed::{open, seal, SealedBoxError};
