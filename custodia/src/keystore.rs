//! # Key Custody Backends
//!
//! The [`KeyCustody`] trait abstracts where private keys actually live.
//! The in-memory implementation here is suitable for tests and for
//! single-process deployments; an HSM or KMS adapter implements the same
//! trait without the wallet layer noticing the difference.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use crate::crypto::{KeyPair, SigningAddress};

/// Errors surfaced by a custody backend.
#[derive(Debug, Error)]
pub enum KeyCustodyError {
    /// No key material is stored for the address.
    #[error("no key material held for {0}")]
    KeyNotFound(SigningAddress),

    /// The backend could not be reached or refused the operation.
    #[error("key custody backend unavailable: {0}")]
    Unavailable(String),
}

/// A store of private key material, keyed by signing address.
#[async_trait]
pub trait KeyCustody: Send + Sync {
    /// Returns the keypair held for `address`, or — when none is held —
    /// generates a fresh keypair, stores it under its *own* address, and
    /// returns it. The requested address is a hint, not a promise: a
    /// generated key can never land on an arbitrary address.
    async fn fetch_or_create_keypair(
        &self,
        address: SigningAddress,
    ) -> Result<KeyPair, KeyCustodyError>;

    /// Removes the key material for `address`. Idempotent: removing an
    /// unknown address succeeds and reports `false`.
    async fn remove_keypair(&self, address: SigningAddress) -> Result<bool, KeyCustodyError>;
}

/// Process-local custody backed by a hash map. Keys live exactly as long
/// as the process does.
#[derive(Default)]
pub struct InMemoryKeyCustody {
    keys: RwLock<HashMap<SigningAddress, KeyPair>>,
}

impl InMemoryKeyCustody {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads a keypair, returning its address.
    pub fn insert(&self, keypair: KeyPair) -> SigningAddress {
        let address = keypair.signing_address();
        self.keys.write().insert(address, keypair);
        address
    }

    /// Number of held keys.
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

#[async_trait]
impl KeyCustody for InMemoryKeyCustody {
    async fn fetch_or_create_keypair(
        &self,
        address: SigningAddress,
    ) -> Result<KeyPair, KeyCustodyError> {
        if let Some(held) = self.keys.read().get(&address) {
            return Ok(held.clone());
        }
        let fresh = KeyPair::generate();
        let fresh_address = fresh.signing_address();
        self.keys.write().insert(fresh_address, fresh.clone());
        info!(requested = %address, created = %fresh_address, "generated key for unheld address");
        Ok(fresh)
    }

    async fn remove_keypair(&self, address: SigningAddress) -> Result<bool, KeyCustodyError> {
        let removed = self.keys.write().remove(&address).is_some();
        if removed {
            info!(%address, "key material removed from custody");
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_returns_held_key() {
        let custody = InMemoryKeyCustody::new();
        let keypair = KeyPair::generate();
        let address = custody.insert(keypair.clone());

        let fetched = custody.fetch_or_create_keypair(address).await.unwrap();
        assert_eq!(fetched, keypair);
        assert_eq!(custody.len(), 1);
    }

    #[tokio::test]
    async fn fetch_unheld_creates_under_own_address() {
        let custody = InMemoryKeyCustody::new();
        let requested = SigningAddress::from_bytes([1u8; 32]);

        let created = custody.fetch_or_create_keypair(requested).await.unwrap();
        assert_ne!(created.signing_address(), requested);
        // The fresh key is fetchable under its own address afterwards.
        let refetched = custody
            .fetch_or_create_keypair(created.signing_address())
            .await
            .unwrap();
        assert_eq!(refetched, created);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let custody = InMemoryKeyCustody::new();
        let address = custody.insert(KeyPair::generate());

        assert!(custody.remove_keypair(address).await.unwrap());
        assert!(!custody.remove_keypair(address).await.unwrap());
        assert!(custody.is_empty());
    }
}
