//! In-memory account provider
//!
//! Reference backend holding its accounts in process. On-chain activity is
//! modelled as a set of (entropy source, group index) pairs, failures can be
//! injected to exercise the error paths of callers.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

use super::{AccountProvider, GroupIndexOptions, MultichainAccountProvider, ProviderError};
use crate::account::{
    bip44_derivation_path, AccountId, Bip44Account, Bip44Entropy, EntropySourceId,
    KeyringAccount, KeyringAccountType,
};
use crate::locks;

pub const SOLANA_MAINNET_SCOPE: &str = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp";
pub const BITCOIN_MAINNET_SCOPE: &str = "bip122:000000000019d6689c085ae165831e93";

pub struct InMemoryAccountProvider {
    name: String,
    account_type: KeyringAccountType,
    scopes: Vec<String>,
    methods: Vec<String>,
    latency: Option<Duration>,
    accounts: RwLock<Vec<KeyringAccount>>,
    activity: RwLock<HashSet<(EntropySourceId, u32)>>,
    failure: RwLock<Option<ProviderError>>,
    discovery_calls: AtomicUsize,
}

impl InMemoryAccountProvider {
    pub fn new(
        name: impl Into<String>,
        account_type: KeyringAccountType,
        scopes: Vec<String>,
        methods: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            account_type,
            scopes,
            methods,
            latency: None,
            accounts: RwLock::new(Vec::new()),
            activity: RwLock::new(HashSet::new()),
            failure: RwLock::new(None),
            discovery_calls: AtomicUsize::new(0),
        }
    }

    pub fn evm() -> Self {
        Self::new(
            "EVM",
            KeyringAccountType::Eip155Eoa,
            vec!["eip155:0".to_string()],
            vec![
                "personal_sign".to_string(),
                "eth_signTransaction".to_string(),
                "eth_signTypedData_v4".to_string(),
            ],
        )
    }

    pub fn solana() -> Self {
        Self::new(
            "Solana",
            KeyringAccountType::SolanaDataAccount,
            vec![SOLANA_MAINNET_SCOPE.to_string()],
            vec!["signAndSendTransaction".to_string(), "signMessage".to_string()],
        )
    }

    pub fn bitcoin() -> Self {
        Self::new(
            "Bitcoin",
            KeyringAccountType::Bip122P2wpkh,
            vec![BITCOIN_MAINNET_SCOPE.to_string()],
            vec!["signPsbt".to_string()],
        )
    }

    /// Delay every async call, to let concurrent callers interleave
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_activity(self, entropy_source: &EntropySourceId, group_indices: &[u32]) -> Self {
        for index in group_indices {
            self.record_activity(entropy_source, *index);
        }
        self
    }

    /// Mark the pair as having on-chain history
    pub fn record_activity(&self, entropy_source: &EntropySourceId, group_index: u32) {
        locks::write(&self.activity).insert((entropy_source.clone(), group_index));
    }

    /// Make every following async call fail with `error`
    pub fn fail_with(&self, error: ProviderError) {
        *locks::write(&self.failure) = Some(error);
    }

    pub fn clear_failure(&self) {
        *locks::write(&self.failure) = None;
    }

    /// Store an account as-is, e.g. an imported private key with no entropy options
    pub fn import_account(&self, account: KeyringAccount) {
        locks::write(&self.accounts).push(account);
    }

    pub fn discovery_calls(&self) -> usize {
        self.discovery_calls.load(Ordering::SeqCst)
    }

    async fn simulate_io(&self) -> Result<(), ProviderError> {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
        match &*locks::read(&self.failure) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn matching_ids(accounts: &[KeyringAccount], options: &GroupIndexOptions) -> Vec<AccountId> {
        accounts
            .iter()
            .filter(|account| {
                Bip44Entropy::from_options(&account.options).is_some_and(|entropy| {
                    entropy.id == options.entropy_source
                        && entropy.group_index == options.group_index
                })
            })
            .map(|account| account.id)
            .collect()
    }

    /// Return the pair's accounts, deriving one first if there are none.
    /// Check and insert happen under one lock so concurrent calls can't both create.
    fn get_or_create_accounts(&self, options: &GroupIndexOptions) -> Vec<AccountId> {
        let mut accounts = locks::write(&self.accounts);
        let existing = Self::matching_ids(&accounts, options);
        if !existing.is_empty() {
            return existing;
        }

        let account = self.derive_account(options);
        debug!(
            provider = %self.name,
            group_index = options.group_index,
            account = %account.id(),
            "Created account"
        );
        let id = account.id();
        accounts.push(account.into_inner());
        vec![id]
    }

    fn derive_account(&self, options: &GroupIndexOptions) -> Bip44Account {
        let namespace = self.account_type.namespace();
        let derivation_path = bip44_derivation_path(namespace, options.group_index);
        let address = derive_address(namespace, &options.entropy_source, &derivation_path);

        Bip44Account::new(
            AccountId::random(),
            self.account_type.clone(),
            address,
            self.scopes.clone(),
            self.methods.clone(),
            Bip44Entropy {
                id: options.entropy_source.clone(),
                group_index: options.group_index,
                derivation_path,
            },
        )
    }
}

/// Deterministic stand-in for key derivation: hash of entropy id and path
fn derive_address(namespace: &str, entropy_source: &EntropySourceId, path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entropy_source.as_str().as_bytes());
    hasher.update(b"/");
    hasher.update(path.as_bytes());
    let digest = hasher.finalize();

    match namespace {
        "eip155" => format!("0x{}", hex::encode(&digest[..20])),
        "bip122" => format!("bc1q{}", hex::encode(&digest[..20])),
        _ => hex::encode(digest),
    }
}

impl MultichainAccountProvider for InMemoryAccountProvider {
    fn get_account(&self, id: &AccountId) -> Option<Bip44Account> {
        locks::read(&self.accounts)
            .iter()
            .find(|account| &account.id == id)
            .cloned()
            .and_then(|account| Bip44Account::try_from(account).ok())
    }

    fn get_accounts(&self, options: &GroupIndexOptions) -> Vec<AccountId> {
        Self::matching_ids(&locks::read(&self.accounts), options)
    }
}

#[async_trait]
impl AccountProvider for InMemoryAccountProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        self.account_type.namespace()
    }

    fn get_all_accounts(&self) -> Vec<KeyringAccount> {
        locks::read(&self.accounts).clone()
    }

    async fn create_accounts(
        &self,
        options: &GroupIndexOptions,
    ) -> Result<Vec<AccountId>, ProviderError> {
        self.simulate_io().await?;
        Ok(self.get_or_create_accounts(options))
    }

    async fn discover_and_create_accounts(
        &self,
        options: &GroupIndexOptions,
    ) -> Result<Vec<AccountId>, ProviderError> {
        self.discovery_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_io().await?;

        let active = locks::read(&self.activity)
            .contains(&(options.entropy_source.clone(), options.group_index));
        if !active {
            return Ok(vec![]);
        }
        Ok(self.get_or_create_accounts(options))
    }
}
