//! Fan-out over the per-namespace providers of a wallet.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::account::{AccountId, Bip44Account};
use crate::error::AccountApiError;
use crate::locks;
use crate::provider::{AccountProvider, GroupIndexOptions, MultichainAccountProvider};

/// Accounts contributed by one provider
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProviderAccounts {
    pub provider: String,
    pub namespace: String,
    pub accounts: Vec<AccountId>,
}

impl ProviderAccounts {
    pub(crate) fn empty(provider: &dyn AccountProvider) -> Self {
        Self {
            provider: provider.name().to_string(),
            namespace: provider.namespace().to_string(),
            accounts: Vec::new(),
        }
    }
}

/// Ordered set of providers plus the routing index from account id to owner.
///
/// Ids are treated as opaque: results are never deduplicated across
/// providers, and when two providers report the same id the first one to be
/// observed keeps the route.
pub struct MultichainProviderAggregator {
    providers: Vec<Arc<dyn AccountProvider>>,
    routes: RwLock<HashMap<AccountId, usize>>,
}

impl MultichainProviderAggregator {
    pub fn new(providers: Vec<Arc<dyn AccountProvider>>) -> Self {
        Self {
            providers,
            routes: RwLock::new(HashMap::new()),
        }
    }

    pub fn providers(&self) -> &[Arc<dyn AccountProvider>] {
        &self.providers
    }

    /// Record `ids` as owned by the provider at `provider_index`. Append-only.
    pub(crate) fn observe(&self, provider_index: usize, ids: &[AccountId]) {
        if ids.is_empty() {
            return;
        }
        let mut routes = locks::write(&self.routes);
        for id in ids {
            routes.entry(*id).or_insert(provider_index);
        }
    }

    pub fn owner_of(&self, id: &AccountId) -> Option<&Arc<dyn AccountProvider>> {
        let index = locks::read(&self.routes).get(id).copied()?;
        self.providers.get(index)
    }

    /// Concatenation of every provider's accounts for the pair, in registration order
    pub fn get_accounts(&self, options: &GroupIndexOptions) -> Vec<AccountId> {
        self.get_accounts_by_provider(options)
            .into_iter()
            .flat_map(|entry| entry.accounts)
            .collect()
    }

    pub fn get_accounts_by_provider(&self, options: &GroupIndexOptions) -> Vec<ProviderAccounts> {
        self.providers
            .iter()
            .enumerate()
            .map(|(index, provider)| {
                let accounts = provider.get_accounts(options);
                self.observe(index, &accounts);
                ProviderAccounts {
                    accounts,
                    ..ProviderAccounts::empty(provider.as_ref())
                }
            })
            .collect()
    }

    /// Resolve an account without knowing its provider
    pub fn get_account(&self, id: &AccountId) -> Option<Bip44Account> {
        if let Some(account) = self.owner_of(id).and_then(|provider| provider.get_account(id)) {
            return Some(account);
        }

        // Ids created outside this aggregator are not routed yet
        self.providers
            .iter()
            .enumerate()
            .find_map(|(index, provider)| {
                let account = provider.get_account(id)?;
                self.observe(index, &[*id]);
                Some(account)
            })
    }

    /// Run `create_accounts` on every provider concurrently.
    ///
    /// Accounts from successful providers are routed even when another
    /// provider fails; the first failure (in registration order) is returned.
    pub async fn create_accounts(
        &self,
        options: &GroupIndexOptions,
    ) -> Result<Vec<ProviderAccounts>, AccountApiError> {
        let results = join_all(
            self.providers
                .iter()
                .map(|provider| provider.create_accounts(options)),
        )
        .await;

        let mut created = Vec::with_capacity(self.providers.len());
        let mut first_error = None;

        for (index, (provider, result)) in self.providers.iter().zip(results).enumerate() {
            match result {
                Ok(accounts) => {
                    self.observe(index, &accounts);
                    debug!(
                        provider = provider.name(),
                        group_index = options.group_index,
                        count = accounts.len(),
                        "Provider accounts ready"
                    );
                    created.push(ProviderAccounts {
                        accounts,
                        ..ProviderAccounts::empty(provider.as_ref())
                    });
                }
                Err(source) => {
                    first_error.get_or_insert(AccountApiError::Provider {
                        provider: provider.name().to_string(),
                        source,
                    });
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(created),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::EntropySourceId;
    use crate::multichain::test_support::dyn_providers;
    use crate::provider::{InMemoryAccountProvider, ProviderError};

    fn options(group_index: u32) -> GroupIndexOptions {
        GroupIndexOptions::new(EntropySourceId::new("seed").unwrap(), group_index)
    }

    #[tokio::test]
    async fn test_get_accounts_in_registration_order() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let sol = Arc::new(InMemoryAccountProvider::solana());
        let evm_ids = evm.create_accounts(&options(0)).await.unwrap();
        let sol_ids = sol.create_accounts(&options(0)).await.unwrap();

        let aggregator = MultichainProviderAggregator::new(dyn_providers(&[&evm, &sol]));
        let all = aggregator.get_accounts(&options(0));

        assert_eq!(all, [evm_ids.clone(), sol_ids.clone()].concat());
        assert!(aggregator.get_accounts(&options(1)).is_empty());

        // Listing populated the routes
        assert_eq!(aggregator.owner_of(&evm_ids[0]).unwrap().name(), "EVM");
        assert_eq!(aggregator.owner_of(&sol_ids[0]).unwrap().name(), "Solana");
    }

    #[tokio::test]
    async fn test_get_account_falls_back_to_scan() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let sol = Arc::new(InMemoryAccountProvider::solana());
        let aggregator = MultichainProviderAggregator::new(dyn_providers(&[&evm, &sol]));

        let ids = sol.create_accounts(&options(0)).await.unwrap();
        assert!(aggregator.owner_of(&ids[0]).is_none());

        let account = aggregator.get_account(&ids[0]).unwrap();
        assert_eq!(account.namespace(), "solana");
        assert_eq!(aggregator.owner_of(&ids[0]).unwrap().name(), "Solana");

        assert!(aggregator.get_account(&AccountId::random()).is_none());
    }

    #[tokio::test]
    async fn test_create_accounts_fans_out() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let sol = Arc::new(InMemoryAccountProvider::solana());
        let aggregator = MultichainProviderAggregator::new(dyn_providers(&[&evm, &sol]));

        let created = aggregator.create_accounts(&options(0)).await.unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].provider, "EVM");
        assert_eq!(created[1].namespace, "solana");
        for entry in &created {
            assert_eq!(entry.accounts.len(), 1);
            assert!(aggregator.get_account(&entry.accounts[0]).is_some());
        }
        assert_eq!(evm.get_accounts(&options(0)), created[0].accounts);
    }

    #[tokio::test]
    async fn test_create_accounts_propagates_provider_failure() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let sol = Arc::new(InMemoryAccountProvider::solana());
        sol.fail_with(ProviderError::SignerUnavailable("locked".to_string()));
        let aggregator = MultichainProviderAggregator::new(dyn_providers(&[&evm, &sol]));

        let err = aggregator.create_accounts(&options(0)).await.unwrap_err();
        match err {
            AccountApiError::Provider { provider, source } => {
                assert_eq!(provider, "Solana");
                assert_eq!(source, ProviderError::SignerUnavailable("locked".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }

        // The healthy provider's account is still routed
        let evm_ids = evm.get_accounts(&options(0));
        assert_eq!(evm_ids.len(), 1);
        assert_eq!(aggregator.owner_of(&evm_ids[0]).unwrap().name(), "EVM");
    }
}
