//! # Account Registry
//!
//! The in-memory collection of keypairs a custodian actually holds.
//!
//! Insertion order is preserved and observable: when an operator lists
//! accounts, they appear in the order they were added, not in whatever
//! order a hash map feels like today. Operators build muscle memory around
//! account listings; we don't break it.

use std::collections::HashMap;

use crate::crypto::{KeyPair, SigningAddress};

/// Keypairs held by the wallet, keyed by signing address, iterated in
/// insertion order.
///
/// Plain data structure — no locking here. Concurrent access is the
/// session layer's job ([`crate::wallet::session`]).
#[derive(Default)]
pub struct AccountRegistry {
    keypairs: HashMap<SigningAddress, KeyPair>,
    order: Vec<SigningAddress>,
}

impl AccountRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keypair, returning its signing address.
    ///
    /// Re-adding an address the registry already holds replaces the stored
    /// keypair but keeps the original position in the listing. (With a
    /// matching address the key material is necessarily identical anyway,
    /// so this is a no-op in practice.)
    pub fn add(&mut self, keypair: KeyPair) -> SigningAddress {
        let address = keypair.signing_address();
        if self.keypairs.insert(address, keypair).is_none() {
            self.order.push(address);
        }
        address
    }

    /// Removes the keypair for `address`, returning it if present.
    /// Removing an unknown address is a quiet no-op — deletion is
    /// idempotent.
    pub fn remove(&mut self, address: &SigningAddress) -> Option<KeyPair> {
        let removed = self.keypairs.remove(address);
        if removed.is_some() {
            self.order.retain(|a| a != address);
        }
        removed
    }

    /// Whether the registry holds a keypair for `address`.
    pub fn contains(&self, address: &SigningAddress) -> bool {
        self.keypairs.contains_key(address)
    }

    /// Borrows the keypair for `address`, if held.
    pub fn get(&self, address: &SigningAddress) -> Option<&KeyPair> {
        self.keypairs.get(address)
    }

    /// All held addresses in insertion order.
    pub fn addresses(&self) -> Vec<SigningAddress> {
        self.order.clone()
    }

    /// Iterates held keypairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SigningAddress, &KeyPair)> {
        self.order
            .iter()
            .filter_map(|addr| self.keypairs.get(addr).map(|kp| (addr, kp)))
    }

    /// Number of held accounts.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get() {
        let mut registry = AccountRegistry::new();
        let kp = KeyPair::generate();
        let addr = registry.add(kp.clone());
        assert!(registry.contains(&addr));
        assert_eq!(registry.get(&addr), Some(&kp));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn listing_preserves_insertion_order() {
        let mut registry = AccountRegistry::new();
        let addrs: Vec<SigningAddress> =
            (0..5).map(|_| registry.add(KeyPair::generate())).collect();
        assert_eq!(registry.addresses(), addrs);
    }

    #[test]
    fn re_adding_keeps_position() {
        let mut registry = AccountRegistry::new();
        let first = KeyPair::generate();
        let a = registry.add(first.clone());
        let b = registry.add(KeyPair::generate());
        registry.add(first);
        assert_eq!(registry.addresses(), vec![a, b]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = AccountRegistry::new();
        let addr = registry.add(KeyPair::generate());
        assert!(registry.remove(&addr).is_some());
        assert!(registry.remove(&addr).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_unknown_address_is_noop() {
        let mut registry = AccountRegistry::new();
        registry.add(KeyPair::generate());
        let stranger = KeyPair::generate().signing_address();
        assert!(registry.remove(&stranger).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn iter_pairs_addresses_with_keypairs() {
        let mut registry = AccountRegistry::new();
        let addr = registry.add(KeyPair::generate());
        let collected: Vec<_> = registry.iter().collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(*collected[0].0, addr);
        assert_eq!(collected[0].1.signing_address(), addr);
    }
}
