use std::sync::Arc;

use super::aggregator::{MultichainProviderAggregator, ProviderAccounts};
use crate::account::{AccountId, AccountSelector, Bip44Account};
use crate::ids::{
    to_multichain_account_group_id, AccountGroupId, AccountWalletId, MultichainAccountGroupId,
    MultichainAccountWalletId,
};
use crate::wallet::{AccountGroup, AccountGroupType};

/// Accounts sharing one (entropy source, group index) pair across every namespace
#[derive(Clone)]
pub struct MultichainAccountGroup {
    id: MultichainAccountGroupId,
    members: Vec<ProviderAccounts>,
    aggregator: Arc<MultichainProviderAggregator>,
}

impl MultichainAccountGroup {
    pub(crate) fn new(
        wallet_id: &MultichainAccountWalletId,
        group_index: u32,
        members: Vec<ProviderAccounts>,
        aggregator: Arc<MultichainProviderAggregator>,
    ) -> Self {
        Self {
            id: to_multichain_account_group_id(wallet_id, group_index),
            members,
            aggregator,
        }
    }

    pub fn multichain_id(&self) -> &MultichainAccountGroupId {
        &self.id
    }

    pub fn multichain_wallet_id(&self) -> &MultichainAccountWalletId {
        self.id.wallet_id()
    }

    pub fn group_index(&self) -> u32 {
        self.id.group_index()
    }

    /// Per-provider membership, in provider registration order
    pub fn members(&self) -> &[ProviderAccounts] {
        &self.members
    }

    pub fn get_accounts(&self) -> Vec<Bip44Account> {
        self.members
            .iter()
            .flat_map(|member| member.accounts.iter())
            .filter_map(|id| self.aggregator.get_account(id))
            .collect()
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.members.iter().any(|member| member.accounts.contains(id))
    }

    pub fn select(&self, selector: &AccountSelector) -> Vec<Bip44Account> {
        self.get_accounts()
            .into_iter()
            .filter(|account| selector.matches(account.account()))
            .collect()
    }

    /// Every provider contributes at least one account
    pub fn is_aligned(&self) -> bool {
        self.members.iter().all(|member| !member.accounts.is_empty())
    }

    /// Names of the providers with no account in this group
    pub fn missing_providers(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|member| member.accounts.is_empty())
            .map(|member| member.provider.as_str())
            .collect()
    }
}

impl AccountGroup for MultichainAccountGroup {
    type Account = Bip44Account;

    fn id(&self) -> AccountGroupId {
        self.id.clone().into()
    }

    fn group_type(&self) -> AccountGroupType {
        AccountGroupType::MultichainAccount
    }

    fn wallet_id(&self) -> AccountWalletId {
        self.id.wallet_id().clone().into()
    }

    fn account_ids(&self) -> Vec<AccountId> {
        self.members
            .iter()
            .flat_map(|member| member.accounts.iter().copied())
            .collect()
    }

    fn get_account(&self, id: &AccountId) -> Option<Bip44Account> {
        if !self.contains(id) {
            return None;
        }
        self.aggregator.get_account(id)
    }
}

impl std::fmt::Debug for MultichainAccountGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultichainAccountGroup")
            .field("id", &self.id)
            .field("members", &self.members)
            .finish()
    }
}
