//! Multichain accounts
//!
//! Composes per-namespace providers into one view keyed by
//! (entropy source, group index): fan-out, discovery, wallet and groups.

pub mod aggregator;
pub mod discovery;
pub mod group;
pub mod wallet;

pub use aggregator::{MultichainProviderAggregator, ProviderAccounts};
pub use discovery::{DiscoveryReport, DiscoveryRound, ProviderDiscovery};
pub use group::MultichainAccountGroup;
pub use wallet::MultichainAccountWallet;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::provider::{AccountProvider, InMemoryAccountProvider};

    pub fn dyn_providers(
        providers: &[&Arc<InMemoryAccountProvider>],
    ) -> Vec<Arc<dyn AccountProvider>> {
        providers
            .iter()
            .map(|provider| Arc::clone(provider) as Arc<dyn AccountProvider>)
            .collect()
    }
}
