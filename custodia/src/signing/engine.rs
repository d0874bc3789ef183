//! # Signing Engine
//!
//! Turns a resolved [`SignerAuthority`] into an actual signature, using
//! only keys the wallet holds. The error taxonomy here is deliberately
//! precise — a custodian staring at a failed signing request needs to
//! know *which* key was missing and *why* it was needed, not just that
//! "signing failed".

use tracing::{info, warn};

use crate::crypto::SigningAddress;
use crate::signing::resolver::{
    resolve, AuthorizedSignerLookup, LookupError, SignerAuthority,
};
use crate::txn::multisig::{MultisigTransaction, MultisigTxnError, SignedMultisigTransaction};
use crate::txn::{sign_transaction, SignedTransaction, Transaction};
use crate::wallet::accounts::AccountRegistry;
use crate::wallet::multisig::MultisigRegistry;
use thiserror::Error;

/// Errors raised while signing on behalf of an account.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The wallet does not hold a key for the sender account.
    #[error("wallet does not contain account {address}")]
    AccountNotFound {
        /// The missing account.
        address: SigningAddress,
    },

    /// The sender has been rekeyed, and the wallet holds neither the
    /// sender's original key nor — crucially — the authorized one.
    #[error("sender {sender} is rekeyed, and the wallet does not contain authorized account {authorized}")]
    AuthorizedAccountNotFound {
        /// The rekeyed sender.
        sender: SigningAddress,
        /// The authority the wallet is missing.
        authorized: SigningAddress,
    },

    /// The sender's authority is a multisig group, so no single key can
    /// produce a valid signature. The caller must run the multisig
    /// ceremony instead.
    #[error("sender {sender} is controlled by multisig group {group}; use the multisig signing flow")]
    AmbiguousSigner {
        /// The sender account.
        sender: SigningAddress,
        /// The controlling group's address.
        group: SigningAddress,
    },

    /// The requested signing member's key is not held by the wallet.
    #[error("wallet does not contain multisig member {member} of group {group}")]
    MemberKeyNotHeld {
        /// The member whose key is missing.
        member: SigningAddress,
        /// The group the member belongs to.
        group: SigningAddress,
    },

    /// No group definition is registered under the given address.
    #[error("no multisig group registered under {address}")]
    MultisigGroupNotFound {
        /// The unknown group address.
        address: SigningAddress,
    },

    /// The authority lookup itself failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// A multisig ceremony step failed.
    #[error(transparent)]
    Multisig(#[from] MultisigTxnError),
}

/// Signs `txn` with whichever single key is currently authorized for its
/// sender.
///
/// Resolution happens here, per call — one authority lookup, no cache.
/// The three single-key outcomes:
///
/// - **Direct**: the sender's own key signs; `auth_address` stays unset.
/// - **Delegated**: the authorized account's key signs and is recorded as
///   `auth_address`. The sender's own key being absent is irrelevant —
///   custodians routinely hold only the authority key for rekeyed
///   accounts.
/// - **GroupDelegated**: refused with [`SigningError::AmbiguousSigner`];
///   no single key constitutes group authority.
pub async fn sign(
    txn: Transaction,
    accounts: &AccountRegistry,
    multisigs: &MultisigRegistry,
    lookup: &dyn AuthorizedSignerLookup,
) -> Result<SignedTransaction, SigningError> {
    let authority = resolve(txn.sender, lookup, multisigs).await?;
    sign_resolved(txn, authority, accounts)
}

/// Applies an already-resolved authority to produce a signature.
///
/// Synchronous: no lookup happens here. Callers that manage their own
/// locking (the wallet session) resolve first, then apply under a short
/// registry lock.
pub fn sign_resolved(
    txn: Transaction,
    authority: SignerAuthority,
    accounts: &AccountRegistry,
) -> Result<SignedTransaction, SigningError> {
    let sender = txn.sender;
    match authority {
        SignerAuthority::Direct => {
            let keypair = accounts
                .get(&sender)
                .ok_or(SigningError::AccountNotFound { address: sender })?;
            info!(%sender, txn = %txn.id(), "signing with account's own key");
            Ok(sign_transaction(txn, keypair))
        }
        SignerAuthority::Delegated(authorized) => {
            let keypair =
                accounts
                    .get(&authorized)
                    .ok_or(SigningError::AuthorizedAccountNotFound {
                        sender,
                        authorized,
                    })?;
            info!(%sender, %authorized, txn = %txn.id(), "signing with delegated authority");
            Ok(sign_transaction(txn, keypair))
        }
        SignerAuthority::GroupDelegated(group) => {
            let group_address = group.address();
            warn!(%sender, group = %group_address, "single-key signing refused for multisig authority");
            Err(SigningError::AmbiguousSigner {
                sender,
                group: group_address,
            })
        }
    }
}

/// Starts a multisig ceremony for `txn` under the group registered at
/// `group_address`.
///
/// The transaction's sender may be the group address itself or an
/// account rekeyed to the group — this is the entry point a caller
/// reaches for after [`sign`] refuses with
/// [`SigningError::AmbiguousSigner`], carrying the *same* transaction.
pub fn new_multisig_transaction(
    txn: Transaction,
    group_address: SigningAddress,
    multisigs: &MultisigRegistry,
) -> Result<MultisigTransaction, SigningError> {
    let group = multisigs
        .export(&group_address)
        .ok_or(SigningError::MultisigGroupNotFound {
            address: group_address,
        })?;
    Ok(MultisigTransaction::new(txn, group))
}

/// Contributes `member`'s signature to an in-flight multisig ceremony.
///
/// The member must belong to the ceremony's group *and* be held by the
/// wallet. The two failures are distinct: a non-member is a protocol
/// error, a missing key is a custody gap.
pub fn sign_multisig(
    partial: &mut MultisigTransaction,
    member: SigningAddress,
    accounts: &AccountRegistry,
) -> Result<(), SigningError> {
    let group_address = partial.group().address();
    if !partial.group().contains(&member) {
        return Err(SigningError::Multisig(MultisigTxnError::MemberNotInGroup {
            member,
            group: group_address,
        }));
    }
    let keypair = accounts.get(&member).ok_or(SigningError::MemberKeyNotHeld {
        member,
        group: group_address,
    })?;
    partial.sign(keypair)?;
    info!(
        %member,
        group = %group_address,
        collected = partial.signature_count(),
        threshold = partial.group().threshold(),
        "multisig signature added"
    );
    Ok(())
}

/// Finalizes a multisig ceremony into a submittable transaction.
pub fn finalize_multisig(
    partial: MultisigTransaction,
) -> Result<SignedMultisigTransaction, SigningError> {
    let group = partial.group().address();
    let signed = partial.finalize()?;
    info!(%group, "multisig transaction finalized");
    Ok(signed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
