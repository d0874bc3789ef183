//! # Multisig Groups
//!
//! A multisig group is a *definition*, not a key: an ordered list of
//! member addresses, a version, and a threshold. Its address is a digest
//! of that definition, which means the address itself can never produce a
//! signature — only members can, and only `threshold` of them together
//! constitute authority.
//!
//! Member order matters everywhere. It feeds the address derivation (the
//! same members in a different order are a *different group* with a
//! different address) and it fixes the slot layout of partially signed
//! transactions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::{MULTISIG_DOMAIN_TAG, MULTISIG_VERSION};
use crate::crypto::SigningAddress;
use crate::wallet::accounts::AccountRegistry;

/// Errors raised while defining or registering multisig groups.
#[derive(Debug, Error)]
pub enum MultisigError {
    /// The threshold is zero or exceeds the member count. Either way the
    /// group could never be satisfied (or would be satisfied by nobody).
    #[error("invalid threshold {threshold} for {member_count} members")]
    InvalidThreshold {
        /// The rejected threshold.
        threshold: u8,
        /// Number of members in the definition.
        member_count: usize,
    },

    /// A group must have at least one member.
    #[error("multisig group has no members")]
    EmptyGroup,

    /// The same address appears twice in the member list. Duplicate
    /// members would let one key count twice toward the threshold.
    #[error("duplicate member {member} in multisig group")]
    DuplicateMember {
        /// The repeated address.
        member: SigningAddress,
    },

    /// A custodial wallet only registers groups it can participate in:
    /// at least one member's keypair must already be held.
    #[error("no member of the multisig group is present in the account registry")]
    NoMemberInRegistry,
}

// ---------------------------------------------------------------------------
// MultisigGroup
// ---------------------------------------------------------------------------

/// An ordered M-of-N multisig account definition.
///
/// Construction via [`new`](Self::new) validates the shape; every value of
/// this type is a satisfiable group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigGroup {
    version: u8,
    threshold: u8,
    members: Vec<SigningAddress>,
}

impl MultisigGroup {
    /// Defines a group over `members` (order-significant) requiring
    /// `threshold` distinct member signatures.
    pub fn new(threshold: u8, members: Vec<SigningAddress>) -> Result<Self, MultisigError> {
        if members.is_empty() {
            return Err(MultisigError::EmptyGroup);
        }
        if threshold == 0 || threshold as usize > members.len() {
            return Err(MultisigError::InvalidThreshold {
                threshold,
                member_count: members.len(),
            });
        }
        let mut seen = HashMap::new();
        for &member in &members {
            if seen.insert(member, ()).is_some() {
                return Err(MultisigError::DuplicateMember { member });
            }
        }
        Ok(Self {
            version: MULTISIG_VERSION,
            threshold,
            members,
        })
    }

    /// The group's derived address: a SHA-512/256 digest over the
    /// domain tag, version, threshold, and members in order.
    ///
    /// Deliberately *not* an Ed25519 point — nothing can ever sign as the
    /// group directly.
    pub fn address(&self) -> SigningAddress {
        let mut hasher = Sha512_256::new();
        hasher.update(MULTISIG_DOMAIN_TAG);
        hasher.update([self.version, self.threshold]);
        for member in &self.members {
            hasher.update(member.as_bytes());
        }
        SigningAddress::from_bytes(hasher.finalize().into())
    }

    /// The group format version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Number of member signatures required.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Members in definition order.
    pub fn members(&self) -> &[SigningAddress] {
        &self.members
    }

    /// The slot index of `member`, or `None` for a non-member.
    pub fn member_index(&self, member: &SigningAddress) -> Option<usize> {
        self.members.iter().position(|m| m == member)
    }

    /// Whether `member` belongs to the group.
    pub fn contains(&self, member: &SigningAddress) -> bool {
        self.member_index(member).is_some()
    }
}

// ---------------------------------------------------------------------------
// MultisigRegistry
// ---------------------------------------------------------------------------

/// Multisig group definitions known to the wallet, keyed by derived
/// address, listed in import order.
#[derive(Default)]
pub struct MultisigRegistry {
    groups: HashMap<SigningAddress, MultisigGroup>,
    order: Vec<SigningAddress>,
}

impl MultisigRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports a group definition, returning its derived address.
    ///
    /// A custodial wallet has no business tracking groups it cannot sign
    /// for, so at least one member must be present in `accounts`.
    /// Importing the same definition twice is harmless.
    pub fn import(
        &mut self,
        group: MultisigGroup,
        accounts: &AccountRegistry,
    ) -> Result<SigningAddress, MultisigError> {
        if !group.members().iter().any(|m| accounts.contains(m)) {
            return Err(MultisigError::NoMemberInRegistry);
        }
        let address = group.address();
        if self.groups.insert(address, group).is_none() {
            self.order.push(address);
        }
        Ok(address)
    }

    /// Borrows the definition registered under `address`.
    pub fn get(&self, address: &SigningAddress) -> Option<&MultisigGroup> {
        self.groups.get(address)
    }

    /// Exports (copies) the definition registered under `address`.
    pub fn export(&self, address: &SigningAddress) -> Option<MultisigGroup> {
        self.groups.get(address).cloned()
    }

    /// Whether a group is registered under `address`.
    pub fn contains(&self, address: &SigningAddress) -> bool {
        self.groups.contains_key(address)
    }

    /// Deletes the group registered under `address`. Idempotent.
    pub fn delete(&mut self, address: &SigningAddress) -> Option<MultisigGroup> {
        let removed = self.groups.remove(address);
        if removed.is_some() {
            self.order.retain(|a| a != address);
        }
        removed
    }

    /// All registered group addresses in import order.
    pub fn list(&self) -> Vec<SigningAddress> {
        self.order.clone()
    }

    /// Iterates (address, group) pairs in import order.
    pub fn iter(&self) -> impl Iterator<Item = (&SigningAddress, &MultisigGroup)> {
        self.order
            .iter()
            .filter_map(|addr| self.groups.get(addr).map(|g| (addr, g)))
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no groups are registered.
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
    use crate::crypto::KeyPair;

    fn addr(byte: u8) -> SigningAddress {
        SigningAddress::from_bytes([byte; 32])
    }

    #[test]
    fn valid_group_accepted() {
        let group = MultisigGroup::new(2, vec![addr(1), addr(2), addr(3)]).unwrap();
        assert_eq!(group.threshold(), 2);
        assert_eq!(group.members().len(), 3);
        assert_eq!(group.version(), MULTISIG_VERSION);
    }

    #[test]
    fn zero_threshold_rejected() {
        let err = MultisigGroup::new(0, vec![addr(1)]).unwrap_err();
        assert!(matches!(
            err,
            MultisigError::InvalidThreshold {
                threshold: 0,
                member_count: 1
            }
        ));
    }

    #[test]
    fn threshold_above_member_count_rejected() {
        let err = MultisigGroup::new(3, vec![addr(1), addr(2)]).unwrap_err();
        assert!(matches!(err, MultisigError::InvalidThreshold { .. }));
    }

    #[test]
    fn empty_group_rejected() {
        assert!(matches!(
            MultisigGroup::new(1, vec![]),
            Err(MultisigError::EmptyGroup)
        ));
    }

    #[test]
    fn duplicate_member_rejected() {
        let err = MultisigGroup::new(1, vec![addr(1), addr(1)]).unwrap_err();
        assert!(matches!(err, MultisigError::DuplicateMember { .. }));
    }

    #[test]
    fn address_depends_on_member_order() {
        let forward = MultisigGroup::new(1, vec![addr(1), addr(2)]).unwrap();
        let reversed = MultisigGroup::new(1, vec![addr(2), addr(1)]).unwrap();
        assert_ne!(forward.address(), reversed.address());
    }

    #[test]
    fn address_depends_on_threshold() {
        let one_of_two = MultisigGroup::new(1, vec![addr(1), addr(2)]).unwrap();
        let two_of_two = MultisigGroup::new(2, vec![addr(1), addr(2)]).unwrap();
        assert_ne!(one_of_two.address(), two_of_two.address());
    }

    #[test]
    fn address_is_deterministic() {
        let a = MultisigGroup::new(2, vec![addr(1), addr(2), addr(3)]).unwrap();
        let b = MultisigGroup::new(2, vec![addr(1), addr(2), addr(3)]).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn member_index_follows_definition_order() {
        let group = MultisigGroup::new(2, vec![addr(5), addr(3), addr(9)]).unwrap();
        assert_eq!(group.member_index(&addr(3)), Some(1));
        assert_eq!(group.member_index(&addr(7)), None);
        assert!(group.contains(&addr(9)));
    }

    #[test]
    fn import_requires_a_held_member() {
        let mut accounts = AccountRegistry::new();
        let held = accounts.add(KeyPair::generate());

        let mut registry = MultisigRegistry::new();

        let strangers = MultisigGroup::new(1, vec![addr(1), addr(2)]).unwrap();
        assert!(matches!(
            registry.import(strangers, &accounts),
            Err(MultisigError::NoMemberInRegistry)
        ));

        let with_held = MultisigGroup::new(1, vec![addr(1), held]).unwrap();
        let address = registry.import(with_held.clone(), &accounts).unwrap();
        assert_eq!(address, with_held.address());
        assert!(registry.contains(&address));
    }

    #[test]
    fn export_returns_full_definition() {
        let mut accounts = AccountRegistry::new();
        let held = accounts.add(KeyPair::generate());
        let group = MultisigGroup::new(1, vec![held, addr(2)]).unwrap();

        let mut registry = MultisigRegistry::new();
        let address = registry.import(group.clone(), &accounts).unwrap();
        assert_eq!(registry.export(&address), Some(group));
        assert_eq!(registry.export(&addr(99)), None);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut accounts = AccountRegistry::new();
        let held = accounts.add(KeyPair::generate());
        let group = MultisigGroup::new(1, vec![held]).unwrap();

        let mut registry = MultisigRegistry::new();
        let address = registry.import(group, &accounts).unwrap();
        assert!(registry.delete(&address).is_some());
        assert!(registry.delete(&address).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn list_preserves_import_order() {
        let mut accounts = AccountRegistry::new();
        let held = accounts.add(KeyPair::generate());

        let mut registry = MultisigRegistry::new();
        let a = registry
            .import(MultisigGroup::new(1, vec![held, addr(1)]).unwrap(), &accounts)
            .unwrap();
        let b = registry
            .import(MultisigGroup::new(1, vec![held, addr(2)]).unwrap(), &accounts)
            .unwrap();
        assert_eq!(registry.list(), vec![a, b]);
    }
}
