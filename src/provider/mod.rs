//! Account provider contract
//!
//! A provider is the per-namespace backend (EVM, Solana, Bitcoin, ...) that
//! enumerates, creates and discovers BIP-44 accounts for an
//! (entropy source, group index) pair.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::{AccountId, Bip44Account, EntropySourceId, KeyringAccount};

pub use memory::InMemoryAccountProvider;

/// Failure of a backend call, propagated unchanged by this layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// (entropy source, group index) pair addressed by provider calls
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct GroupIndexOptions {
    pub entropy_source: EntropySourceId,
    pub group_index: u32,
}

impl GroupIndexOptions {
    pub fn new(entropy_source: EntropySourceId, group_index: u32) -> Self {
        Self {
            entropy_source,
            group_index,
        }
    }
}

/// Read-only view: resolve existing multichain accounts
pub trait MultichainAccountProvider: Send + Sync {
    /// Only meaningful for ids this provider handed out; `None` otherwise.
    fn get_account(&self, id: &AccountId) -> Option<Bip44Account>;

    /// Accounts known for the pair, in creation order
    fn get_accounts(&self, options: &GroupIndexOptions) -> Vec<AccountId>;
}

#[async_trait]
pub trait AccountProvider: MultichainAccountProvider {
    fn name(&self) -> &str;

    /// CAIP-2 namespace served by this provider
    fn namespace(&self) -> &str;

    /// Every account the backend holds, BIP-44 or not
    fn get_all_accounts(&self) -> Vec<KeyringAccount>;

    /// Derive and persist the accounts of the pair. Idempotent: accounts
    /// already created for the pair are returned, never duplicated.
    async fn create_accounts(
        &self,
        options: &GroupIndexOptions,
    ) -> Result<Vec<AccountId>, ProviderError>;

    /// Create the accounts of the pair only if they have on-chain activity.
    /// No activity is an empty result, not an error.
    async fn discover_and_create_accounts(
        &self,
        options: &GroupIndexOptions,
    ) -> Result<Vec<AccountId>, ProviderError>;
}
