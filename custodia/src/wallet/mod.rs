//! # Wallet
//!
//! What the custodian holds and how it is organized: the account registry
//! (keypairs), the multisig registry (group definitions), and the session
//! facade that makes both safe to share across threads.

pub mod accounts;
pub mod multisig;
pub mod session;

pub use accounts::AccountRegistry;
pub use multisig::{MultisigError, MultisigGroup, MultisigRegistry};
pub use session::WalletSession;
