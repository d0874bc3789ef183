// Copyright (c) 2026 Custodia Contributors. MIT License.
// See LICENSE for details.

//! # Custodia — Core Library
//!
//! An authorization-aware transaction signing engine for custodial
//! wallets. The hard part of custody is not producing Ed25519 signatures;
//! it's knowing *which* key is entitled to sign for an account whose
//! authority can be reassigned at any moment — rekeyed to another
//! account, or to a multisig group. Custodia makes that question a
//! first-class, freshly-answered one on every signing request.
//!
//! ## Architecture
//!
//! The library is split into modules that mirror the actual concerns of a
//! signing service:
//!
//! - **crypto** — Keys, addresses, recovery phrases, sealed boxes. Boring
//!   on purpose.
//! - **txn** — Transaction construction and canonical serialization,
//!   including rekey transactions and partially-signed multisig ones.
//! - **wallet** — What the custodian holds: account and multisig
//!   registries, plus the thread-safe session facade.
//! - **signing** — Authority resolution and the signing engine. The
//!   reason this library exists.
//! - **keystore** — Pluggable key custody backends.
//! - **config** — Protocol constants. Frozen, or everything breaks.
//!
//! ## Design Philosophy
//!
//! 1. Authority is looked up fresh, never cached. Stale authority signs
//!    invalid transactions at best and unauthorized ones at worst.
//! 2. No unsafe code. We sleep at night.
//! 3. Errors name the exact key that was missing and why it was needed.
//! 4. If it touches key material, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod keystore;
pub mod signing;
pub mod txn;
pub mod wallet;

pub use crypto::{
    EncryptionAddress, KeyError, KeyPair, MnemonicError, RecoveryPhrase, Signature,
    SigningAddress,
};
pub use keystore::{InMemoryKeyCustody, KeyCustody, KeyCustodyError};
pub use signing::{AuthorizedSignerLookup, LookupError, SignerAuthority, SigningError};
pub use txn::multisig::{MultisigTransaction, SignedMultisigTransaction};
pub use txn::{SignedTransaction, Transaction};
pub use wallet::{MultisigError, MultisigGroup, WalletSession};
