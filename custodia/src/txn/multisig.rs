//! # Partially Signed Multisig Transactions
//!
//! A multisig signing ceremony is distributed by nature: each custodian
//! signs independently, possibly on different machines, possibly out of
//! order, and someone eventually merges the pieces. The
//! [`MultisigTransaction`] type makes that ceremony safe — merging is
//! commutative and idempotent, so the order in which partial signatures
//! arrive can never change the outcome.
//!
//! Signatures live in *slots* indexed by the group's member order. A slot
//! either holds a signature from that exact member or is empty. Merging
//! two copies with conflicting signatures in the same slot is an error,
//! not a coin flip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{KeyPair, Signature, SigningAddress};
use crate::txn::{SignedTransaction, Transaction};
use crate::wallet::multisig::MultisigGroup;

/// Errors raised during the multisig signing ceremony.
#[derive(Debug, Error)]
pub enum MultisigTxnError {
    /// The signing key does not belong to any member slot.
    #[error("signer {member} is not a member of multisig group {group}")]
    MemberNotInGroup {
        /// The rejected signer.
        member: SigningAddress,
        /// The group address.
        group: SigningAddress,
    },

    /// Two copies being merged disagree on a slot's signature. Since a
    /// member's signature over fixed bytes is deterministic, this means
    /// one copy is corrupt or signed different bytes.
    #[error("conflicting signatures for member {member} during merge")]
    ConflictingSignature {
        /// The member whose slot conflicts.
        member: SigningAddress,
    },

    /// The two copies being merged describe different groups.
    #[error("cannot merge: multisig group definitions differ")]
    GroupMismatch,

    /// The two copies being merged wrap different transactions.
    #[error("cannot merge: underlying transactions differ")]
    TransactionMismatch,

    /// Finalization was attempted below the group's threshold.
    #[error("insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures {
        /// Signatures collected so far.
        have: usize,
        /// The group threshold.
        need: usize,
    },
}

// ---------------------------------------------------------------------------
// MultisigTransaction
// ---------------------------------------------------------------------------

/// A transaction under multisig authority, accumulating member
/// signatures. The sender is either the group address itself or an
/// account rekeyed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigTransaction {
    txn: Transaction,
    group: MultisigGroup,
    slots: Vec<Option<Signature>>,
}

impl MultisigTransaction {
    /// Starts a signing ceremony for `txn` under `group`.
    ///
    /// The transaction's sender need not be the group's derived address.
    /// An account rekeyed *to* the group sends under its own address
    /// while the group's members do the signing; the finalized
    /// transaction records the group as the authorizing party in that
    /// case, mirroring [`SignedTransaction`]'s `auth_address`.
    pub fn new(txn: Transaction, group: MultisigGroup) -> Self {
        let slots = vec![None; group.members().len()];
        Self { txn, group, slots }
    }

    /// The underlying transaction.
    pub fn txn(&self) -> &Transaction {
        &self.txn
    }

    /// The group definition driving this ceremony.
    pub fn group(&self) -> &MultisigGroup {
        &self.group
    }

    /// Signs with a member keypair, filling that member's slot.
    ///
    /// Signing twice with the same key is idempotent — Ed25519 signatures
    /// are deterministic, so the slot simply receives the same bytes.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<(), MultisigTxnError> {
        let member = keypair.signing_address();
        let index = self
            .group
            .member_index(&member)
            .ok_or(MultisigTxnError::MemberNotInGroup {
                member,
                group: self.group.address(),
            })?;
        self.slots[index] = Some(keypair.sign(&self.txn.signable_bytes()));
        Ok(())
    }

    /// Merges another copy of the same ceremony into this one.
    ///
    /// Commutative and associative: `a.merge(b)` and `b.merge(a)` produce
    /// identical slot states, and merging in any grouping gives the same
    /// result. Empty slots adopt the other copy's signature; filled slots
    /// must agree byte-for-byte.
    pub fn merge(&mut self, other: &MultisigTransaction) -> Result<(), MultisigTxnError> {
        if self.group != other.group {
            return Err(MultisigTxnError::GroupMismatch);
        }
        if self.txn != other.txn {
            return Err(MultisigTxnError::TransactionMismatch);
        }
        for (index, incoming) in other.slots.iter().enumerate() {
            match (&self.slots[index], incoming) {
                (Some(mine), Some(theirs)) if mine != theirs => {
                    return Err(MultisigTxnError::ConflictingSignature {
                        member: self.group.members()[index],
                    });
                }
                (None, Some(theirs)) => self.slots[index] = Some(theirs.clone()),
                _ => {}
            }
        }
        Ok(())
    }

    /// Number of slots currently holding a signature.
    pub fn signature_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether enough signatures have been collected to finalize.
    pub fn is_ready(&self) -> bool {
        self.signature_count() >= self.group.threshold() as usize
    }

    /// The members whose slots are still empty, in definition order.
    pub fn pending_members(&self) -> Vec<SigningAddress> {
        self.group
            .members()
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(member, _)| *member)
            .collect()
    }

    /// Finalizes the ceremony into a submittable signed transaction.
    ///
    /// Fails below threshold. Extra signatures beyond the threshold are
    /// fine and are all carried in the output. When the sender is not
    /// the group address (a rekeyed account), the group address is
    /// recorded as the authorizing party.
    pub fn finalize(self) -> Result<SignedMultisigTransaction, MultisigTxnError> {
        let have = self.signature_count();
        let need = self.group.threshold() as usize;
        if have < need {
            return Err(MultisigTxnError::InsufficientSignatures { have, need });
        }
        let group_address = self.group.address();
        let auth_address = (self.txn.sender != group_address).then_some(group_address);
        Ok(SignedMultisigTransaction {
            txn: self.txn,
            group: self.group,
            slots: self.slots,
            auth_address,
        })
    }
}

// ---------------------------------------------------------------------------
// SignedMultisigTransaction
// ---------------------------------------------------------------------------

/// A finalized multisig transaction carrying a threshold of signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMultisigTransaction {
    txn: Transaction,
    group: MultisigGroup,
    slots: Vec<Option<Signature>>,
    auth_address: Option<SigningAddress>,
}

impl SignedMultisigTransaction {
    /// The underlying transaction.
    pub fn txn(&self) -> &Transaction {
        &self.txn
    }

    /// The group definition the signatures satisfy.
    pub fn group(&self) -> &MultisigGroup {
        &self.group
    }

    /// The authorizing group address, present only when it differs from
    /// the transaction's sender — the rekeyed-to-group case.
    pub fn auth_address(&self) -> Option<SigningAddress> {
        self.auth_address
    }

    /// Verifies every present signature against its member's address and
    /// re-checks the threshold.
    pub fn verify(&self) -> bool {
        let bytes = self.txn.signable_bytes();
        let mut valid = 0usize;
        for (member, slot) in self.group.members().iter().zip(&self.slots) {
            match slot {
                Some(sig) if member.verify(&bytes, sig) => valid += 1,
                Some(_) => return false,
                None => {}
            }
        }
        valid >= self.group.threshold() as usize
    }

    /// The signed equivalent of [`SignedTransaction`] pairs for each
    /// contributing member, useful for audit trails.
    pub fn contributor_signatures(&self) -> Vec<(SigningAddress, Signature)> {
        self.group
            .members()
            .iter()
            .zip(&self.slots)
            .filter_map(|(member, slot)| slot.clone().map(|sig| (*member, sig)))
            .collect()
    }
}

// Re-exported for callers that only think in terms of "signed things".
impl From<SignedMultisigTransaction> for Transaction {
    fn from(signed: SignedMultisigTransaction) -> Self {
        signed.txn
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn group_of(keypairs: &[KeyPair], threshold: u8) -> MultisigGroup {
        let members = keypairs.iter().map(|kp| kp.signing_address()).collect();
        MultisigGroup::new(threshold, members).unwrap()
    }

    fn ceremony(keypairs: &[KeyPair], threshold: u8) -> MultisigTransaction {
        let group = group_of(keypairs, threshold);
        let txn = Transaction::payment(
            group.address(),
            SigningAddress::from_bytes([0xAA; 32]),
            100,
            1,
        );
        MultisigTransaction::new(txn, group)
    }

    #[test]
    fn group_sent_transaction_has_no_auth_address() {
        let kps: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let mut mtx = ceremony(&kps, 1);
        mtx.sign(&kps[0]).unwrap();
        let signed = mtx.finalize().unwrap();
        assert_eq!(signed.auth_address(), None);
    }

    #[test]
    fn rekeyed_sender_records_group_as_authorizing_party() {
        // The sender is an ordinary account whose authority was rekeyed
        // to the group; members sign, and the finalized transaction keeps
        // the original sender while naming the group as authorizer.
        let kps: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let group = group_of(&kps, 2);
        let rekeyed_sender = SigningAddress::from_bytes([0x11; 32]);
        let txn = Transaction::payment(
            rekeyed_sender,
            SigningAddress::from_bytes([0xAA; 32]),
            100,
            1,
        );

        let mut mtx = MultisigTransaction::new(txn, group.clone());
        mtx.sign(&kps[0]).unwrap();
        mtx.sign(&kps[1]).unwrap();
        let signed = mtx.finalize().unwrap();

        assert_eq!(signed.txn().sender, rekeyed_sender);
        assert_eq!(signed.auth_address(), Some(group.address()));
        assert!(signed.verify());
    }

    #[test]
    fn non_member_cannot_sign() {
        let kps: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let mut mtx = ceremony(&kps, 1);
        let outsider = KeyPair::generate();
        assert!(matches!(
            mtx.sign(&outsider),
            Err(MultisigTxnError::MemberNotInGroup { .. })
        ));
    }

    #[test]
    fn threshold_gates_finalization() {
        let kps: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let mut mtx = ceremony(&kps, 2);

        mtx.sign(&kps[0]).unwrap();
        assert!(!mtx.is_ready());
        let err = mtx.clone().finalize().unwrap_err();
        assert!(matches!(
            err,
            MultisigTxnError::InsufficientSignatures { have: 1, need: 2 }
        ));

        mtx.sign(&kps[2]).unwrap();
        assert!(mtx.is_ready());
        let signed = mtx.finalize().unwrap();
        assert!(signed.verify());
    }

    #[test]
    fn re_signing_is_idempotent() {
        let kps: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let mut mtx = ceremony(&kps, 2);
        mtx.sign(&kps[0]).unwrap();
        let snapshot = mtx.clone();
        mtx.sign(&kps[0]).unwrap();
        assert_eq!(mtx, snapshot);
        assert_eq!(mtx.signature_count(), 1);
    }

    #[test]
    fn merge_is_commutative() {
        let kps: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let base = ceremony(&kps, 2);

        let mut copy_a = base.clone();
        copy_a.sign(&kps[0]).unwrap();
        let mut copy_b = base.clone();
        copy_b.sign(&kps[2]).unwrap();

        let mut ab = copy_a.clone();
        ab.merge(&copy_b).unwrap();
        let mut ba = copy_b.clone();
        ba.merge(&copy_a).unwrap();

        assert_eq!(ab, ba);
        assert_eq!(ab.signature_count(), 2);
        assert!(ab.is_ready());
    }

    #[test]
    fn merge_with_overlapping_signatures_succeeds() {
        let kps: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let base = ceremony(&kps, 2);

        let mut copy_a = base.clone();
        copy_a.sign(&kps[0]).unwrap();
        copy_a.sign(&kps[1]).unwrap();
        let mut copy_b = base.clone();
        copy_b.sign(&kps[0]).unwrap();

        // Slot 0 overlaps with identical signatures; no conflict.
        copy_a.merge(&copy_b).unwrap();
        assert_eq!(copy_a.signature_count(), 2);
    }

    #[test]
    fn merge_rejects_conflicting_slot() {
        let kps: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let base = ceremony(&kps, 1);

        let mut copy_a = base.clone();
        copy_a.sign(&kps[0]).unwrap();
        let mut copy_b = base.clone();
        // Forge a different signature into member 0's slot.
        copy_b.sign(&kps[0]).unwrap();
        copy_b.slots[0] = Some(kps[0].sign(b"different bytes entirely"));

        assert!(matches!(
            copy_a.merge(&copy_b),
            Err(MultisigTxnError::ConflictingSignature { .. })
        ));
    }

    #[test]
    fn merge_rejects_different_transactions() {
        let kps: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let group = group_of(&kps, 1);
        let receiver = SigningAddress::from_bytes([0xAA; 32]);

        let mut a = MultisigTransaction::new(
            Transaction::payment(group.address(), receiver, 100, 1),
            group.clone(),
        );
        let b = MultisigTransaction::new(
            Transaction::payment(group.address(), receiver, 200, 1),
            group,
        );

        assert!(matches!(
            a.merge(&b),
            Err(MultisigTxnError::TransactionMismatch)
        ));
    }

    #[test]
    fn merge_rejects_different_groups() {
        let kps: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let group_a = group_of(&kps[..2], 1);
        let group_b = group_of(&kps[1..], 1);
        let receiver = SigningAddress::from_bytes([0xAA; 32]);

        let mut a = MultisigTransaction::new(
            Transaction::payment(group_a.address(), receiver, 100, 1),
            group_a,
        );
        let b = MultisigTransaction::new(
            Transaction::payment(group_b.address(), receiver, 100, 1),
            group_b,
        );

        assert!(matches!(a.merge(&b), Err(MultisigTxnError::GroupMismatch)));
    }

    #[test]
    fn pending_members_tracks_empty_slots() {
        let kps: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let mut mtx = ceremony(&kps, 2);
        mtx.sign(&kps[1]).unwrap();
        assert_eq!(
            mtx.pending_members(),
            vec![kps[0].signing_address(), kps[2].signing_address()]
        );
    }

    #[test]
    fn extra_signatures_beyond_threshold_are_kept() {
        let kps: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let mut mtx = ceremony(&kps, 2);
        for kp in &kps {
            mtx.sign(kp).unwrap();
        }
        let signed = mtx.finalize().unwrap();
        assert_eq!(signed.contributor_signatures().len(), 3);
        assert!(signed.verify());
    }

    #[test]
    fn verify_rejects_invalid_member_signature() {
        let kps: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let mut mtx = ceremony(&kps, 1);
        mtx.sign(&kps[0]).unwrap();
        let mut signed = mtx.finalize().unwrap();
        signed.slots[0] = Some(kps[0].sign(b"wrong preimage"));
        assert!(!signed.verify());
    }
}
