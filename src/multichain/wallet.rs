use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::aggregator::{MultichainProviderAggregator, ProviderAccounts};
use super::discovery::DiscoveryReport;
use super::group::MultichainAccountGroup;
use crate::account::{AccountId, Bip44Account, EntropySourceId};
use crate::config::{DiscoveryConfig, MAX_BIP44_GROUP_INDEX};
use crate::error::AccountApiError;
use crate::ids::{
    to_multichain_account_wallet_id, AccountGroupId, AccountWalletId, MultichainAccountWalletId,
};
use crate::provider::{AccountProvider, GroupIndexOptions};
use crate::wallet::{AccountWallet, AccountWalletType};

/// Every account derived from one entropy source, grouped by group index
pub struct MultichainAccountWallet {
    id: MultichainAccountWalletId,
    aggregator: Arc<MultichainProviderAggregator>,
    config: DiscoveryConfig,
}

impl MultichainAccountWallet {
    pub fn new(entropy_source: EntropySourceId, providers: Vec<Arc<dyn AccountProvider>>) -> Self {
        Self {
            id: to_multichain_account_wallet_id(&entropy_source),
            aggregator: Arc::new(MultichainProviderAggregator::new(providers)),
            config: DiscoveryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn multichain_id(&self) -> &MultichainAccountWalletId {
        &self.id
    }

    pub fn entropy_source(&self) -> &EntropySourceId {
        self.id.entropy_source()
    }

    pub fn aggregator(&self) -> &MultichainProviderAggregator {
        &self.aggregator
    }

    fn options(&self, group_index: u32) -> GroupIndexOptions {
        GroupIndexOptions::new(self.entropy_source().clone(), group_index)
    }

    /// Account ids of every namespace at `group_index`
    pub fn get_accounts(&self, group_index: u32) -> Vec<AccountId> {
        self.aggregator.get_accounts(&self.options(group_index))
    }

    pub fn get_account(&self, id: &AccountId) -> Option<Bip44Account> {
        self.aggregator
            .get_account(id)
            .filter(|account| account.entropy_source() == self.entropy_source())
    }

    /// Current membership per group index, rebuilt from the providers
    fn collect_groups(&self) -> BTreeMap<u32, Vec<ProviderAccounts>> {
        let providers = self.aggregator.providers();
        let mut groups: BTreeMap<u32, Vec<ProviderAccounts>> = BTreeMap::new();

        for (provider_index, provider) in providers.iter().enumerate() {
            for account in provider.get_all_accounts() {
                let account_id = account.id;
                let account = match Bip44Account::try_from(account) {
                    Ok(account) => account,
                    Err(e) => {
                        // Imported keys and the like have no group index
                        debug!(
                            provider = provider.name(),
                            account = %account_id,
                            "Skipping account: {}",
                            e
                        );
                        continue;
                    }
                };
                if account.entropy_source() != self.entropy_source() {
                    continue;
                }

                self.aggregator.observe(provider_index, &[account_id]);
                let members = groups.entry(account.group_index()).or_insert_with(|| {
                    providers
                        .iter()
                        .map(|p| ProviderAccounts::empty(p.as_ref()))
                        .collect()
                });
                members[provider_index].accounts.push(account_id);
            }
        }

        groups
    }

    fn to_group(&self, group_index: u32, members: Vec<ProviderAccounts>) -> MultichainAccountGroup {
        MultichainAccountGroup::new(&self.id, group_index, members, Arc::clone(&self.aggregator))
    }

    /// Groups sorted by group index
    pub fn get_multichain_account_groups(&self) -> Vec<MultichainAccountGroup> {
        self.collect_groups()
            .into_iter()
            .map(|(index, members)| self.to_group(index, members))
            .collect()
    }

    pub fn get_multichain_account_group(&self, group_index: u32) -> Option<MultichainAccountGroup> {
        self.collect_groups()
            .remove(&group_index)
            .map(|members| self.to_group(group_index, members))
    }

    /// One past the highest group index in use, 0 for an empty wallet
    pub fn next_group_index(&self) -> u32 {
        self.collect_groups()
            .keys()
            .next_back()
            .map(|last| last.saturating_add(1))
            .unwrap_or(0)
    }

    /// Create (or complete) the group at `group_index` in every namespace.
    ///
    /// Groups are contiguous: an index past `next_group_index` is rejected,
    /// and so is any index above `MAX_BIP44_GROUP_INDEX`.
    pub async fn create_multichain_account_group(
        &self,
        group_index: u32,
    ) -> Result<MultichainAccountGroup, AccountApiError> {
        if group_index > MAX_BIP44_GROUP_INDEX {
            return Err(AccountApiError::GroupIndexOutOfRange {
                requested: group_index,
                max: MAX_BIP44_GROUP_INDEX,
            });
        }
        let next = self.next_group_index();
        if group_index > next {
            return Err(AccountApiError::GroupIndexOutOfSequence {
                requested: group_index,
                next,
            });
        }

        let members = self.aggregator.create_accounts(&self.options(group_index)).await?;
        info!(wallet = %self.id, group_index, "Multichain account group ready");
        Ok(self.to_group(group_index, members))
    }

    pub async fn create_next_multichain_account_group(
        &self,
    ) -> Result<MultichainAccountGroup, AccountApiError> {
        self.create_multichain_account_group(self.next_group_index())
            .await
    }

    pub async fn discover_and_create_accounts(&self) -> Result<DiscoveryReport, AccountApiError> {
        self.aggregator
            .discover_and_create_accounts(self.entropy_source(), &self.config)
            .await
    }

    /// Create the missing accounts of every existing group so each namespace
    /// has an account in each group. Failures are logged and skipped.
    /// Returns how many accounts were created.
    pub async fn align_groups(&self) -> usize {
        let providers = self.aggregator.providers();
        let mut created = 0;

        for group in self.get_multichain_account_groups() {
            if group.is_aligned() {
                continue;
            }
            let options = self.options(group.group_index());
            let missing: Vec<usize> = group
                .members()
                .iter()
                .enumerate()
                .filter(|(_, member)| member.accounts.is_empty())
                .map(|(index, _)| index)
                .collect();

            let results = join_all(
                missing
                    .iter()
                    .map(|index| providers[*index].create_accounts(&options)),
            )
            .await;

            for (index, result) in missing.into_iter().zip(results) {
                match result {
                    Ok(accounts) => {
                        self.aggregator.observe(index, &accounts);
                        created += accounts.len();
                    }
                    Err(e) => warn!(
                        provider = providers[index].name(),
                        group_index = options.group_index,
                        "Failed to align group: {}",
                        e
                    ),
                }
            }
        }

        if created > 0 {
            info!(wallet = %self.id, created, "Aligned multichain account groups");
        }
        created
    }
}

impl AccountWallet for MultichainAccountWallet {
    type Group = MultichainAccountGroup;

    fn id(&self) -> AccountWalletId {
        self.id.clone().into()
    }

    fn wallet_type(&self) -> AccountWalletType {
        AccountWalletType::Entropy
    }

    fn get_account_group(&self, id: &AccountGroupId) -> Option<MultichainAccountGroup> {
        if id.wallet_id().as_str() != self.id.as_str() {
            return None;
        }
        let group_index = id.discriminator().group_index()?;
        self.get_multichain_account_group(group_index)
    }

    fn get_account_groups(&self) -> Vec<MultichainAccountGroup> {
        self.get_multichain_account_groups()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountSelector, KeyringAccount, KeyringAccountType};
    use crate::ids::{to_account_group_id, to_default_account_group_id};
    use crate::multichain::test_support::dyn_providers;
    use crate::provider::{InMemoryAccountProvider, ProviderError};
    use crate::wallet::{AccountGroup, AccountGroupType};
    use serde_json::json;

    fn seed() -> EntropySourceId {
        EntropySourceId::new("seed").unwrap()
    }

    fn wallet_with(providers: &[&Arc<InMemoryAccountProvider>]) -> MultichainAccountWallet {
        MultichainAccountWallet::new(seed(), dyn_providers(providers))
    }

    #[tokio::test]
    async fn test_wallet_identity() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let wallet = wallet_with(&[&evm]);

        assert_eq!(AccountWallet::id(&wallet).as_str(), "entropy:seed");
        assert_eq!(wallet.wallet_type(), AccountWalletType::Entropy);
        assert_eq!(wallet.next_group_index(), 0);
        assert!(wallet.get_multichain_account_groups().is_empty());
    }

    #[tokio::test]
    async fn test_create_groups_in_sequence() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let sol = Arc::new(InMemoryAccountProvider::solana());
        let wallet = wallet_with(&[&evm, &sol]);

        let first = wallet.create_next_multichain_account_group().await.unwrap();
        let second = wallet.create_next_multichain_account_group().await.unwrap();

        assert_eq!(first.group_index(), 0);
        assert_eq!(second.group_index(), 1);
        assert_eq!(AccountGroup::id(&second).as_str(), "entropy:seed:1");
        assert_eq!(second.group_type(), AccountGroupType::MultichainAccount);
        assert_eq!(second.account_ids().len(), 2);
        assert!(second.is_aligned());
        assert_eq!(wallet.next_group_index(), 2);

        let err = wallet.create_multichain_account_group(5).await.unwrap_err();
        assert!(matches!(
            err,
            AccountApiError::GroupIndexOutOfSequence { requested: 5, next: 2 }
        ));
    }

    #[tokio::test]
    async fn test_group_index_is_capped_at_last_bip44_index() {
        let sol = Arc::new(InMemoryAccountProvider::solana());
        sol.create_accounts(&GroupIndexOptions::new(seed(), MAX_BIP44_GROUP_INDEX - 1))
            .await
            .unwrap();
        let wallet = wallet_with(&[&sol]);

        let last = wallet
            .create_multichain_account_group(MAX_BIP44_GROUP_INDEX)
            .await
            .unwrap();
        assert_eq!(last.group_index(), 0x7fff_ffff);
        assert_eq!(
            last.get_accounts()[0].entropy().derivation_path,
            "m/44'/501'/2147483647'/0'"
        );
        assert_eq!(wallet.next_group_index(), 0x8000_0000);

        let err = wallet.create_multichain_account_group(0x8000_0000).await.unwrap_err();
        assert!(matches!(
            err,
            AccountApiError::GroupIndexOutOfRange { requested: 0x8000_0000, max: 0x7fff_ffff }
        ));
        assert!(matches!(
            wallet.create_next_multichain_account_group().await,
            Err(AccountApiError::GroupIndexOutOfRange { .. })
        ));
        assert_eq!(sol.get_all_accounts().len(), 2);
    }

    #[tokio::test]
    async fn test_recreating_a_group_is_idempotent() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let wallet = wallet_with(&[&evm]);

        let first = wallet.create_multichain_account_group(0).await.unwrap();
        let again = wallet.create_multichain_account_group(0).await.unwrap();

        assert_eq!(first.account_ids(), again.account_ids());
        assert_eq!(evm.get_all_accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_group_accounts_and_lookup() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let sol = Arc::new(InMemoryAccountProvider::solana());
        let wallet = wallet_with(&[&evm, &sol]);
        wallet.create_next_multichain_account_group().await.unwrap();

        let group = wallet.get_multichain_account_group(0).unwrap();
        let accounts = group.get_accounts();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].namespace(), "eip155");
        assert_eq!(accounts[1].namespace(), "solana");

        let sol_id = accounts[1].id();
        assert_eq!(group.get_account(&sol_id).unwrap().id(), sol_id);
        assert!(group.get_account(&AccountId::random()).is_none());

        let evm_only = group.select(&AccountSelector {
            scopes: Some(vec!["eip155:10".to_string()]),
            ..Default::default()
        });
        assert_eq!(evm_only.len(), 1);
        assert_eq!(evm_only[0].namespace(), "eip155");

        let by_group_id = wallet.get_account_group(&AccountGroup::id(&group)).unwrap();
        assert_eq!(by_group_id.account_ids(), group.account_ids());
    }

    #[tokio::test]
    async fn test_get_account_group_rejects_foreign_ids() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let wallet = wallet_with(&[&evm]);
        wallet.create_next_multichain_account_group().await.unwrap();

        let own: AccountWalletId = AccountWallet::id(&wallet);
        assert!(wallet.get_account_group(&to_default_account_group_id(&own)).is_none());
        assert!(wallet
            .get_account_group(&to_account_group_id(&own, "custom").unwrap())
            .is_none());

        let other: AccountGroupId = "entropy:other:0".parse().unwrap();
        assert!(wallet.get_account_group(&other).is_none());
    }

    #[tokio::test]
    async fn test_groups_skip_foreign_and_non_bip44_accounts() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let other_seed = EntropySourceId::new("other").unwrap();
        evm.create_accounts(&GroupIndexOptions::new(other_seed, 0))
            .await
            .unwrap();
        evm.import_account(KeyringAccount {
            id: AccountId::random(),
            account_type: KeyringAccountType::Eip155Eoa,
            address: "0x02".to_string(),
            scopes: vec![],
            options: json!({ "entropy": { "type": "private-key" } })
                .as_object()
                .cloned()
                .unwrap(),
            methods: vec![],
        });

        let wallet = wallet_with(&[&evm]);
        assert!(wallet.get_multichain_account_groups().is_empty());

        evm.create_accounts(&GroupIndexOptions::new(seed(), 0))
            .await
            .unwrap();
        let groups = wallet.get_multichain_account_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].account_ids().len(), 1);
    }

    #[tokio::test]
    async fn test_wallet_get_account_is_scoped_to_entropy_source() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let foreign = evm
            .create_accounts(&GroupIndexOptions::new(EntropySourceId::new("other").unwrap(), 0))
            .await
            .unwrap();
        let wallet = wallet_with(&[&evm]);
        let own = wallet.create_next_multichain_account_group().await.unwrap();

        assert!(wallet.get_account(&foreign[0]).is_none());
        assert!(wallet.get_account(&own.account_ids()[0]).is_some());
        assert_eq!(wallet.get_accounts(0), own.account_ids());
    }

    #[tokio::test]
    async fn test_discovery_then_alignment() {
        let evm = Arc::new(InMemoryAccountProvider::evm().with_activity(&seed(), &[0, 1]));
        let sol = Arc::new(InMemoryAccountProvider::solana().with_activity(&seed(), &[0]));
        let wallet = wallet_with(&[&evm, &sol]);

        let report = wallet.discover_and_create_accounts().await.unwrap();
        assert_eq!(report.discovered_group_indices(), vec![0, 1]);

        let groups = wallet.get_multichain_account_groups();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_aligned());
        assert_eq!(groups[1].missing_providers(), vec!["Solana"]);

        assert_eq!(wallet.align_groups().await, 1);
        assert!(wallet
            .get_multichain_account_groups()
            .iter()
            .all(MultichainAccountGroup::is_aligned));
        assert_eq!(wallet.align_groups().await, 0);
    }

    #[tokio::test]
    async fn test_alignment_skips_failing_provider() {
        let evm = Arc::new(InMemoryAccountProvider::evm());
        let sol = Arc::new(InMemoryAccountProvider::solana());
        let btc = Arc::new(InMemoryAccountProvider::bitcoin());
        evm.create_accounts(&GroupIndexOptions::new(seed(), 0))
            .await
            .unwrap();
        sol.fail_with(ProviderError::SignerUnavailable("locked".to_string()));
        let wallet = wallet_with(&[&evm, &sol, &btc]);

        assert_eq!(wallet.align_groups().await, 1);
        let group = wallet.get_multichain_account_group(0).unwrap();
        assert_eq!(group.missing_providers(), vec!["Solana"]);
    }

    #[tokio::test]
    async fn test_discovery_respects_wallet_config() {
        let evm = Arc::new(InMemoryAccountProvider::evm().with_activity(&seed(), &[0, 1, 2]));
        let wallet = wallet_with(&[&evm]).with_config(DiscoveryConfig {
            max_group_index: Some(0),
            ..Default::default()
        });

        let report = wallet.discover_and_create_accounts().await.unwrap();

        assert_eq!(report.discovered_group_indices(), vec![0]);
        assert_eq!(wallet.next_group_index(), 1);
    }
}
