//! # The Signing Engine
//!
//! Where authorization meets key custody. The [`resolver`] decides which
//! key (or group) is entitled to sign a transaction; the [`engine`]
//! applies that decision against the wallet's registries and produces
//! signatures — or precise, actionable errors when it can't.
//!
//! The split exists so that authority resolution can be tested, mocked,
//! and reasoned about without any key material in sight.

pub mod engine;
pub mod resolver;

pub use engine::{
    finalize_multisig, new_multisig_transaction, sign, sign_multisig, sign_resolved,
    SigningError,
};
pub use resolver::{classify, resolve, AuthorizedSignerLookup, LookupError, SignerAuthority};
