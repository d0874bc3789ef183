//! # Transactions
//!
//! Construction, canonical serialization, signing, and verification of
//! payment transactions — including the rekeying operations that make the
//! rest of this library interesting.
//!
//! A transaction that carries `rekey_to` changes which key controls the
//! sender account *from that point on*. The account's address never
//! changes; only the authority behind it does. Rekeying back is just
//! another rekey whose target is the account's own address.
//!
//! Signing and authority *resolution* are deliberately separated: this
//! module signs with whatever keypair it is handed and records the
//! signer's identity when it differs from the sender. Deciding which key
//! is *entitled* to sign lives in [`crate::signing`].

pub mod multisig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{MAX_TXN_GROUP_SIZE, TXN_DOMAIN_TAG, TXN_GROUP_DOMAIN_TAG};
use crate::crypto::{KeyPair, Signature, SigningAddress};

/// Errors raised during transaction assembly and group signing.
#[derive(Debug, Error)]
pub enum TxnError {
    /// A signer index points past the end of the transaction list.
    #[error("signer index {index} out of range for group of {len}")]
    SignerIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of transactions in the group.
        len: usize,
    },

    /// The group exceeds the protocol's atomic group size limit.
    #[error("transaction group too large: {got} transactions, maximum {MAX_TXN_GROUP_SIZE}")]
    GroupTooLarge {
        /// Number of transactions supplied.
        got: usize,
    },

    /// Transactions in a group carry mismatched or pre-assigned group ids.
    #[error("transaction already belongs to a group")]
    AlreadyGrouped,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An unsigned payment transaction.
///
/// The canonical byte format used for signing and ID computation is
/// produced by [`signable_bytes`](Self::signable_bytes). JSON/serde is
/// intentionally avoided for that purpose because field ordering is not
/// guaranteed across serialization formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The account being debited — and, when `rekey_to` is set, the
    /// account whose signing authority is being reassigned.
    pub sender: SigningAddress,

    /// The account being credited.
    pub receiver: SigningAddress,

    /// Transfer amount in the smallest unit. Zero is legal and is the
    /// normal case for pure rekey transactions.
    pub amount: u64,

    /// Fee paid for processing.
    pub fee: u64,

    /// Optional binary memo. For human-readable notes, encode as UTF-8.
    pub note: Option<Vec<u8>>,

    /// When set, reassigns the sender account's signing authority to this
    /// address once the transaction commits.
    pub rekey_to: Option<SigningAddress>,

    /// Atomic group id, set by [`assign_group_id`]. Transactions sharing a
    /// group id commit together or not at all.
    pub group: Option<[u8; 32]>,
}

impl Transaction {
    /// Builds an ordinary payment.
    pub fn payment(sender: SigningAddress, receiver: SigningAddress, amount: u64, fee: u64) -> Self {
        Self {
            sender,
            receiver,
            amount,
            fee,
            note: None,
            rekey_to: None,
            group: None,
        }
    }

    /// Builds a rekey transaction: a zero-amount self-payment that hands
    /// the account's signing authority to `new_authority`.
    pub fn rekey(account: SigningAddress, new_authority: SigningAddress, fee: u64) -> Self {
        Self {
            sender: account,
            receiver: account,
            amount: 0,
            fee,
            note: None,
            rekey_to: Some(new_authority),
            group: None,
        }
    }

    /// Builds the inverse of [`rekey`](Self::rekey): returns signing
    /// authority to the account's own key. On the wire this is just a
    /// rekey whose target is the sender itself.
    pub fn rekey_back(account: SigningAddress, fee: u64) -> Self {
        Self::rekey(account, account, fee)
    }

    /// Attaches a binary note.
    pub fn with_note(mut self, note: Vec<u8>) -> Self {
        self.note = Some(note);
        self
    }

    /// Returns the canonical byte representation used for signing, ID, and
    /// group-id computation.
    ///
    /// Deterministic concatenation: domain tag, then each field with
    /// fixed-width little-endian integers and explicit presence bytes for
    /// the optionals. No format drift, no field-order surprises.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(192);

        buf.extend_from_slice(TXN_DOMAIN_TAG);
        buf.extend_from_slice(self.sender.as_bytes());
        buf.extend_from_slice(self.receiver.as_bytes());
        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());

        match &self.note {
            Some(note) => {
                buf.push(0x01);
                buf.extend_from_slice(&(note.len() as u64).to_le_bytes());
                buf.extend_from_slice(note);
            }
            None => buf.push(0x00),
        }

        match &self.rekey_to {
            Some(addr) => {
                buf.push(0x01);
                buf.extend_from_slice(addr.as_bytes());
            }
            None => buf.push(0x00),
        }

        match &self.group {
            Some(group) => {
                buf.push(0x01);
                buf.extend_from_slice(group);
            }
            None => buf.push(0x00),
        }

        buf
    }

    /// Transaction ID: `hex(blake3(signable_bytes))`. Stable across
    /// signing — the signature is not part of the preimage.
    pub fn id(&self) -> String {
        hex::encode(blake3::hash(&self.signable_bytes()).as_bytes())
    }
}

/// Computes and assigns a shared group id across a batch of transactions.
///
/// The group id is a BLAKE3 digest over the concatenated canonical bytes
/// of every member (with their `group` fields unset), so it commits to the
/// exact contents *and order* of the batch. Any transaction already in a
/// group is rejected rather than silently regrouped.
pub fn assign_group_id(txns: &mut [Transaction]) -> Result<[u8; 32], TxnError> {
    if txns.len() > MAX_TXN_GROUP_SIZE {
        return Err(TxnError::GroupTooLarge { got: txns.len() });
    }
    if txns.iter().any(|t| t.group.is_some()) {
        return Err(TxnError::AlreadyGrouped);
    }

    let mut hasher = blake3::Hasher::new();
    hasher.update(TXN_GROUP_DOMAIN_TAG);
    for txn in txns.iter() {
        hasher.update(&txn.signable_bytes());
    }
    let group_id = *hasher.finalize().as_bytes();

    for txn in txns.iter_mut() {
        txn.group = Some(group_id);
    }
    Ok(group_id)
}

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// A transaction plus the signature authorizing it.
///
/// `auth_address` records *who actually signed* when that differs from the
/// sender — the rekeyed case. For a plainly-owned account it stays `None`,
/// keeping the common case compact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The signed transaction body.
    pub txn: Transaction,

    /// Ed25519 signature over [`Transaction::signable_bytes`].
    pub signature: Signature,

    /// The signing authority's address, present only when it differs from
    /// `txn.sender`.
    pub auth_address: Option<SigningAddress>,
}

impl SignedTransaction {
    /// The address whose key must verify the signature: `auth_address`
    /// when present, else the sender.
    pub fn signer(&self) -> SigningAddress {
        self.auth_address.unwrap_or(self.txn.sender)
    }

    /// Verifies the signature against the effective signer address.
    ///
    /// Note this checks *cryptographic* validity only. Whether the signer
    /// was actually authorized for the sender at commit time is a ledger
    /// question this library cannot answer offline.
    pub fn verify(&self) -> bool {
        self.signer().verify(&self.txn.signable_bytes(), &self.signature)
    }
}

/// Signs a transaction with `keypair`, recording the signer's address as
/// `auth_address` when it is not the sender.
pub fn sign_transaction(txn: Transaction, keypair: &KeyPair) -> SignedTransaction {
    let signer = keypair.signing_address();
    let signature = keypair.sign(&txn.signable_bytes());
    let auth_address = (signer != txn.sender).then_some(signer);
    SignedTransaction {
        txn,
        signature,
        auth_address,
    }
}

/// Signs the transactions at `indexes` within an atomic group, leaving the
/// others untouched. Returns the signed subset in index order.
///
/// This is the multi-party flow: each participant signs their own slice of
/// the group and the slices are recombined before submission.
pub fn sign_transaction_group(
    txns: &[Transaction],
    indexes: &[usize],
    keypair: &KeyPair,
) -> Result<Vec<SignedTransaction>, TxnError> {
    let mut signed = Vec::with_capacity(indexes.len());
    for &index in indexes {
        let txn = txns.get(index).ok_or(TxnError::SignerIndexOutOfRange {
            index,
            len: txns.len(),
        })?;
        signed.push(sign_transaction(txn.clone(), keypair));
    }
    Ok(signed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
