//! # Authorization Resolution
//!
//! Answers the one question everything else depends on: *who is entitled
//! to sign for this sender right now?*
//!
//! Rekeying makes the answer dynamic. The ledger — not this library — is
//! the source of truth for an account's current signing authority, so
//! resolution goes through the [`AuthorizedSignerLookup`] trait: exactly
//! one lookup per request, no caching, no staleness window beyond the
//! lookup itself. A cached authority is a signed transaction away from
//! being wrong, and "we signed with a revoked key" is not an incident
//! report anyone wants to write.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::crypto::SigningAddress;
use crate::wallet::multisig::{MultisigGroup, MultisigRegistry};

/// Errors surfaced by an [`AuthorizedSignerLookup`] implementation.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The sender account does not exist on the ledger.
    #[error("account {0} not found on the ledger")]
    AccountNotFound(SigningAddress),

    /// The authority source could not be reached. Retryable; carries the
    /// backend's own description of what went wrong.
    #[error("authority lookup unavailable: {0}")]
    Unavailable(String),
}

/// Source of truth for each account's current signing authority.
///
/// Implementations typically query a node or indexer. The contract is
/// simple: given a sender address, return the address currently entitled
/// to sign for it — which is the sender itself for a never-rekeyed
/// account.
#[async_trait]
pub trait AuthorizedSignerLookup: Send + Sync {
    /// Returns the address currently authorized to sign for `sender`.
    async fn lookup_authorized_signer(
        &self,
        sender: SigningAddress,
    ) -> Result<SigningAddress, LookupError>;
}

/// The resolved signing authority for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerAuthority {
    /// The sender's own key signs. The common, boring case.
    Direct,

    /// A single foreign key signs: the sender has been rekeyed to this
    /// address.
    Delegated(SigningAddress),

    /// A registered multisig group signs — either the sender *is* the
    /// group address, or the sender has been rekeyed to one. A raw
    /// single-key signing call cannot proceed; the caller must run the
    /// multisig ceremony.
    GroupDelegated(MultisigGroup),
}

/// Classifies an already-looked-up authority against the wallet's known
/// multisig groups. Synchronous by design: callers that must not hold
/// locks across an await point run the lookup first, then classify.
///
/// Classification order matters: the authorized address is checked against
/// the multisig registry *first*, so a sender rekeyed to a group address
/// is `GroupDelegated` even though the group address also "differs from
/// the sender". Only then do we distinguish `Direct` from `Delegated`.
pub fn classify(
    sender: SigningAddress,
    authorized: SigningAddress,
    multisigs: &MultisigRegistry,
) -> SignerAuthority {
    if let Some(group) = multisigs.get(&authorized) {
        debug!(%sender, group = %authorized, "resolved multisig signing authority");
        return SignerAuthority::GroupDelegated(group.clone());
    }

    if authorized == sender {
        debug!(%sender, "resolved direct signing authority");
        SignerAuthority::Direct
    } else {
        debug!(%sender, %authorized, "resolved delegated signing authority");
        SignerAuthority::Delegated(authorized)
    }
}

/// Resolves the signing authority for `sender` with exactly one lookup.
pub async fn resolve(
    sender: SigningAddress,
    lookup: &dyn AuthorizedSignerLookup,
    multisigs: &MultisigRegistry,
) -> Result<SignerAuthority, LookupError> {
    let authorized = lookup.lookup_authorized_signer(sender).await?;
    Ok(classify(sender, authorized, multisigs))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::signing::testing::StaticLookup;
    use crate::wallet::accounts::AccountRegistry;

    fn addr(byte: u8) -> SigningAddress {
        SigningAddress::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn never_rekeyed_account_is_direct() {
        let sender = addr(1);
        let lookup = StaticLookup::new(vec![sender]);
        let multisigs = MultisigRegistry::new();

        let authority = resolve(sender, &lookup, &multisigs).await.unwrap();
        assert_eq!(authority, SignerAuthority::Direct);
    }

    #[tokio::test]
    async fn rekeyed_account_is_delegated() {
        let sender = addr(1);
        let new_authority = addr(2);
        let mut lookup = StaticLookup::new(vec![sender]);
        lookup.rekey(sender, new_authority);
        let multisigs = MultisigRegistry::new();

        let authority = resolve(sender, &lookup, &multisigs).await.unwrap();
        assert_eq!(authority, SignerAuthority::Delegated(new_authority));
    }

    #[tokio::test]
    async fn rekey_to_registered_group_is_group_delegated() {
        let mut accounts = AccountRegistry::new();
        let member = accounts.add(KeyPair::generate());
        let group = MultisigGroup::new(1, vec![member, addr(9)]).unwrap();
        let group_address = group.address();

        let mut multisigs = MultisigRegistry::new();
        multisigs.import(group.clone(), &accounts).unwrap();

        let sender = addr(1);
        let mut lookup = StaticLookup::new(vec![sender]);
        lookup.rekey(sender, group_address);

        let authority = resolve(sender, &lookup, &multisigs).await.unwrap();
        assert_eq!(authority, SignerAuthority::GroupDelegated(group));
    }

    #[tokio::test]
    async fn sender_that_is_a_group_address_is_group_delegated() {
        let mut accounts = AccountRegistry::new();
        let member = accounts.add(KeyPair::generate());
        let group = MultisigGroup::new(1, vec![member]).unwrap();
        let group_address = group.address();

        let mut multisigs = MultisigRegistry::new();
        multisigs.import(group.clone(), &accounts).unwrap();

        // A never-rekeyed group account: authorized == sender == group addr.
        let lookup = StaticLookup::new(vec![group_address]);
        let authority = resolve(group_address, &lookup, &multisigs).await.unwrap();
        assert_eq!(authority, SignerAuthority::GroupDelegated(group));
    }

    #[tokio::test]
    async fn rekey_to_unregistered_group_falls_back_to_delegated() {
        // The ledger says the authority is some address we have no group
        // definition for. We cannot know it's a group; it resolves as a
        // plain delegation and signing will fail with a missing key later.
        let sender = addr(1);
        let unknown_group = addr(7);
        let mut lookup = StaticLookup::new(vec![sender]);
        lookup.rekey(sender, unknown_group);
        let multisigs = MultisigRegistry::new();

        let authority = resolve(sender, &lookup, &multisigs).await.unwrap();
        assert_eq!(authority, SignerAuthority::Delegated(unknown_group));
    }

    #[tokio::test]
    async fn unknown_sender_propagates_lookup_error() {
        let lookup = StaticLookup::new(vec![]);
        let multisigs = MultisigRegistry::new();
        let err = resolve(addr(1), &lookup, &multisigs).await.unwrap_err();
        assert!(matches!(err, LookupError::AccountNotFound(_)));
    }
}
