//! # Wallet Session
//!
//! The thread-safe facade over the account and multisig registries — the
//! surface a custody service actually programs against. Registries are
//! plain data structures; this layer adds the locking, the logging, and
//! the convenience flows (rekeying, ceremonies) that string the lower
//! modules together.
//!
//! Locking discipline: registry locks are held only for synchronous
//! sections. The authority lookup is awaited *before* any lock is taken,
//! then classification and signing run under short read locks. No lock is
//! ever held across an await point.

use parking_lot::RwLock;
use tracing::info;

use crate::crypto::{KeyError, KeyPair, PublicAddresses, RecoveryPhrase, SigningAddress};
use crate::keystore::{KeyCustody, KeyCustodyError};
use crate::signing::engine::{self, SigningError};
use crate::signing::resolver::{classify, AuthorizedSignerLookup};
use crate::txn::multisig::{MultisigTransaction, SignedMultisigTransaction};
use crate::txn::{SignedTransaction, Transaction};
use crate::wallet::accounts::AccountRegistry;
use crate::wallet::multisig::{MultisigError, MultisigGroup, MultisigRegistry};

/// A live wallet: held accounts, known multisig groups, and the signing
/// flows over them. Cheap to share behind an `Arc`.
#[derive(Default)]
pub struct WalletSession {
    accounts: RwLock<AccountRegistry>,
    multisigs: RwLock<MultisigRegistry>,
}

impl WalletSession {
    /// Opens an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Generates a fresh account and registers it.
    pub fn generate_account(&self) -> SigningAddress {
        let keypair = KeyPair::generate();
        let address = self.accounts.write().add(keypair);
        info!(%address, "account generated");
        address
    }

    /// Imports an existing keypair. Importing a held account again is a
    /// harmless no-op.
    pub fn import_account(&self, keypair: KeyPair) -> SigningAddress {
        let address = self.accounts.write().add(keypair);
        info!(%address, "account imported");
        address
    }

    /// Imports an account from its 25-word recovery phrase.
    pub fn import_from_recovery_phrase(
        &self,
        phrase: &RecoveryPhrase,
    ) -> Result<SigningAddress, crate::crypto::MnemonicError> {
        let keypair = KeyPair::from_recovery_phrase(phrase)?;
        Ok(self.import_account(keypair))
    }

    /// Imports an account from its hex-encoded key blob.
    pub fn import_from_encoded(&self, encoded: &str) -> Result<SigningAddress, KeyError> {
        let keypair = KeyPair::from_encoded_string(encoded)?;
        Ok(self.import_account(keypair))
    }

    /// Imports an account from a custody backend, fetching (or creating)
    /// the key material there and registering the resulting account.
    ///
    /// The signing path never touches custody backends; this is strictly
    /// a wallet-administration flow.
    pub async fn import_from_custody(
        &self,
        custody: &dyn KeyCustody,
        address: SigningAddress,
    ) -> Result<SigningAddress, KeyCustodyError> {
        let keypair = custody.fetch_or_create_keypair(address).await?;
        Ok(self.import_account(keypair))
    }

    /// Exports the recovery phrase for a held account.
    pub fn export_recovery_phrase(&self, address: &SigningAddress) -> Option<RecoveryPhrase> {
        self.accounts
            .read()
            .get(address)
            .map(KeyPair::to_recovery_phrase)
    }

    /// Both public addresses for a held account.
    pub fn public_addresses(&self, address: &SigningAddress) -> Option<PublicAddresses> {
        self.accounts
            .read()
            .get(address)
            .map(KeyPair::public_addresses)
    }

    /// Deletes a held account's key material. Idempotent — deleting an
    /// unknown address reports `false` and changes nothing.
    pub fn delete_account(&self, address: &SigningAddress) -> bool {
        let removed = self.accounts.write().remove(address).is_some();
        if removed {
            info!(%address, "account deleted");
        }
        removed
    }

    /// Whether the wallet holds a key for `address`.
    pub fn contains_account(&self, address: &SigningAddress) -> bool {
        self.accounts.read().contains(address)
    }

    /// Held account addresses in the order they were added.
    pub fn list_accounts(&self) -> Vec<SigningAddress> {
        self.accounts.read().addresses()
    }

    // -----------------------------------------------------------------------
    // Multisig groups
    // -----------------------------------------------------------------------

    /// Registers a multisig group the wallet can participate in.
    pub fn import_multisig(&self, group: MultisigGroup) -> Result<SigningAddress, MultisigError> {
        let accounts = self.accounts.read();
        let address = self.multisigs.write().import(group, &accounts)?;
        info!(group = %address, "multisig group imported");
        Ok(address)
    }

    /// Exports a registered group definition.
    pub fn export_multisig(&self, address: &SigningAddress) -> Option<MultisigGroup> {
        self.multisigs.read().export(address)
    }

    /// Whether a group is registered under `address`.
    pub fn contains_multisig(&self, address: &SigningAddress) -> bool {
        self.multisigs.read().contains(address)
    }

    /// Deletes a registered group. Idempotent.
    pub fn delete_multisig(&self, address: &SigningAddress) -> bool {
        let removed = self.multisigs.write().delete(address).is_some();
        if removed {
            info!(group = %address, "multisig group deleted");
        }
        removed
    }

    /// Registered groups with their derived addresses, in import order.
    pub fn list_multisigs(&self) -> Vec<(SigningAddress, MultisigGroup)> {
        self.multisigs
            .read()
            .iter()
            .map(|(address, group)| (*address, group.clone()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------------

    /// Signs a transaction with whichever key currently holds authority
    /// over its sender. One fresh authority lookup per call.
    pub async fn sign(
        &self,
        txn: Transaction,
        lookup: &dyn AuthorizedSignerLookup,
    ) -> Result<SignedTransaction, SigningError> {
        // Await outside the locks, classify and sign inside them.
        let authorized = lookup.lookup_authorized_signer(txn.sender).await?;
        let authority = classify(txn.sender, authorized, &self.multisigs.read());
        engine::sign_resolved(txn, authority, &self.accounts.read())
    }

    /// Builds and signs a rekey transaction handing `account`'s authority
    /// to `new_authority`. The transaction is signed by whoever holds
    /// authority *now* — which is exactly what the ledger will demand.
    pub async fn rekey(
        &self,
        account: SigningAddress,
        new_authority: SigningAddress,
        fee: u64,
        lookup: &dyn AuthorizedSignerLookup,
    ) -> Result<SignedTransaction, SigningError> {
        info!(%account, %new_authority, "building rekey transaction");
        self.sign(Transaction::rekey(account, new_authority, fee), lookup)
            .await
    }

    /// Builds and signs the rekey that returns `account` to self-control.
    pub async fn rekey_back(
        &self,
        account: SigningAddress,
        fee: u64,
        lookup: &dyn AuthorizedSignerLookup,
    ) -> Result<SignedTransaction, SigningError> {
        info!(%account, "building rekey-back transaction");
        self.sign(Transaction::rekey_back(account, fee), lookup).await
    }

    /// Starts a multisig ceremony for a transaction under a registered
    /// group's authority — sent from the group address itself, or from
    /// an account rekeyed to it.
    pub fn new_multisig_transaction(
        &self,
        txn: Transaction,
        group_address: SigningAddress,
    ) -> Result<MultisigTransaction, SigningError> {
        engine::new_multisig_transaction(txn, group_address, &self.multisigs.read())
    }

    /// Contributes a held member key's signature to a ceremony.
    pub fn sign_multisig(
        &self,
        partial: &mut MultisigTransaction,
        member: SigningAddress,
    ) -> Result<(), SigningError> {
        engine::sign_multisig(partial, member, &self.accounts.read())
    }

    /// Finalizes a ceremony into a submittable transaction.
    pub fn finalize_multisig(
        &self,
        partial: MultisigTransaction,
    ) -> Result<SignedMultisigTransaction, SigningError> {
        engine::finalize_multisig(partial)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::testing::StaticLookup;

    fn addr(byte: u8) -> SigningAddress {
        SigningAddress::from_bytes([byte; 32])
    }

    #[test]
    fn account_lifecycle() {
        let session = WalletSession::new();
        let address = session.generate_account();
        assert!(session.contains_account(&address));
        assert_eq!(session.list_accounts(), vec![address]);

        let phrase = session.export_recovery_phrase(&address).unwrap();
        assert!(session.delete_account(&address));
        assert!(!session.delete_account(&address));

        let restored = session.import_from_recovery_phrase(&phrase).unwrap();
        assert_eq!(restored, address);
    }

    #[test]
    fn import_from_encoded_blob() {
        let session = WalletSession::new();
        let keypair = KeyPair::generate();
        let encoded = keypair.to_encoded_string();
        let address = session.import_from_encoded(&encoded).unwrap();
        assert_eq!(address, keypair.signing_address());
    }

    #[tokio::test]
    async fn import_from_custody_registers_fetched_key() {
        use crate::keystore::InMemoryKeyCustody;

        let custody = InMemoryKeyCustody::new();
        let keypair = KeyPair::generate();
        let address = custody.insert(keypair);

        let session = WalletSession::new();
        let imported = session.import_from_custody(&custody, address).await.unwrap();
        assert_eq!(imported, address);
        assert!(session.contains_account(&address));
    }

    #[test]
    fn public_addresses_for_held_account() {
        let session = WalletSession::new();
        let address = session.generate_account();
        let addresses = session.public_addresses(&address).unwrap();
        assert_eq!(addresses.signing, address);
        assert!(session.public_addresses(&addr(99)).is_none());
    }

    #[test]
    fn multisig_lifecycle() {
        let session = WalletSession::new();
        let member = session.generate_account();
        let group = MultisigGroup::new(1, vec![member, addr(2)]).unwrap();

        let address = session.import_multisig(group.clone()).unwrap();
        assert!(session.contains_multisig(&address));
        assert_eq!(session.export_multisig(&address), Some(group.clone()));
        assert_eq!(session.list_multisigs(), vec![(address, group)]);

        assert!(session.delete_multisig(&address));
        assert!(!session.delete_multisig(&address));
    }

    #[tokio::test]
    async fn signing_for_own_account() {
        let session = WalletSession::new();
        let sender = session.generate_account();
        let lookup = StaticLookup::new(vec![sender]);

        let txn = Transaction::payment(sender, addr(2), 100, 1);
        let signed = session.sign(txn, &lookup).await.unwrap();
        assert!(signed.verify());
        assert!(signed.auth_address.is_none());
    }

    #[tokio::test]
    async fn rekey_then_sign_with_new_authority() {
        let session = WalletSession::new();
        let account = session.generate_account();
        let authority = session.generate_account();
        let mut lookup = StaticLookup::new(vec![account]);

        // The rekey itself is signed by the current (original) authority.
        let rekey_txn = session.rekey(account, authority, 1, &lookup).await.unwrap();
        assert!(rekey_txn.auth_address.is_none());
        assert_eq!(rekey_txn.txn.rekey_to, Some(authority));

        // Ledger applies the rekey; subsequent signing uses the new key.
        lookup.rekey(account, authority);
        let txn = Transaction::payment(account, addr(9), 50, 1);
        let signed = session.sign(txn, &lookup).await.unwrap();
        assert_eq!(signed.auth_address, Some(authority));
        assert!(signed.verify());

        // Deleting the original key does not break delegated signing.
        session.delete_account(&account);
        let txn = Transaction::payment(account, addr(9), 25, 1);
        assert!(session.sign(txn, &lookup).await.unwrap().verify());
    }

    #[tokio::test]
    async fn rekey_back_restores_self_control() {
        let session = WalletSession::new();
        let account = session.generate_account();
        let authority = session.generate_account();
        let mut lookup = StaticLookup::new(vec![account]);
        lookup.rekey(account, authority);

        // The rekey-back must be signed by the current authority.
        let back = session.rekey_back(account, 1, &lookup).await.unwrap();
        assert_eq!(back.auth_address, Some(authority));
        assert_eq!(back.txn.rekey_to, Some(account));

        lookup.rekey(account, account);
        let txn = Transaction::payment(account, addr(9), 10, 1);
        let signed = session.sign(txn, &lookup).await.unwrap();
        assert!(signed.auth_address.is_none());
    }

    #[tokio::test]
    async fn rekey_to_multisig_group_forces_ceremony() {
        let session = WalletSession::new();
        let account = session.generate_account();
        let member_a = session.generate_account();
        let member_b = session.generate_account();
        let member_c = session.generate_account();

        let group = MultisigGroup::new(2, vec![member_a, member_b, member_c]).unwrap();
        let group_address = session.import_multisig(group).unwrap();

        let mut lookup = StaticLookup::new(vec![account]);
        lookup.rekey(account, group_address);

        // Single-key signing for the rekeyed account is refused, and the
        // refusal names the resolved group.
        let txn = Transaction::payment(account, addr(9), 100, 1);
        let err = session.sign(txn.clone(), &lookup).await.unwrap_err();
        let resolved = match err {
            SigningError::AmbiguousSigner { group, .. } => group,
            other => panic!("unexpected error: {other:?}"),
        };
        assert_eq!(resolved, group_address);

        // The SAME transaction — sender still the rekeyed account — is
        // driven through the ceremony with two of the three members.
        let mut partial = session.new_multisig_transaction(txn, resolved).unwrap();
        session.sign_multisig(&mut partial, member_a).unwrap();
        session.sign_multisig(&mut partial, member_c).unwrap();
        let signed = session.finalize_multisig(partial).unwrap();

        assert_eq!(signed.txn().sender, account);
        assert_eq!(signed.auth_address(), Some(group_address));
        assert!(signed.verify());
    }

    #[tokio::test]
    async fn missing_authority_key_reports_both_addresses() {
        let session = WalletSession::new();
        let account = session.generate_account();
        let foreign_authority = addr(7);
        let mut lookup = StaticLookup::new(vec![account]);
        lookup.rekey(account, foreign_authority);

        let txn = Transaction::payment(account, addr(9), 100, 1);
        let err = session.sign(txn, &lookup).await.unwrap_err();
        assert!(matches!(
            err,
            SigningError::AuthorizedAccountNotFound { sender, authorized }
                if sender == account && authorized == foreign_authority
        ));
    }
}
