//! Gap-terminated account discovery.
//!
//! For each group index, starting at the configured one, every provider
//! probes its namespace concurrently. The index has content when at least one
//! provider created accounts for it; discovery moves on to the next index only
//! in that case and stops at the first index where every namespace came back
//! empty.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::aggregator::MultichainProviderAggregator;
use crate::account::{AccountId, EntropySourceId};
use crate::config::DiscoveryConfig;
use crate::error::AccountApiError;
use crate::provider::{AccountProvider, GroupIndexOptions};

/// Outcome of one provider's probe at one group index
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProviderDiscovery {
    pub provider: String,
    pub namespace: String,
    pub accounts: Vec<AccountId>,
    /// Set when the provider failed and was counted as empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiscoveryRound {
    pub group_index: u32,
    pub results: Vec<ProviderDiscovery>,
}

impl DiscoveryRound {
    pub fn has_content(&self) -> bool {
        self.results.iter().any(|result| !result.accounts.is_empty())
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.results.iter().flat_map(|result| result.accounts.iter())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiscoveryReport {
    pub entropy_source: EntropySourceId,
    /// Every probed index, including the terminating empty one
    pub rounds: Vec<DiscoveryRound>,
}

impl DiscoveryReport {
    /// Discovered accounts, by group index then provider registration order
    pub fn accounts(&self) -> Vec<AccountId> {
        self.rounds
            .iter()
            .flat_map(|round| round.accounts().copied())
            .collect()
    }

    pub fn discovered_group_indices(&self) -> Vec<u32> {
        self.rounds
            .iter()
            .filter(|round| round.has_content())
            .map(|round| round.group_index)
            .collect()
    }

    /// True when probing stopped on the index limit rather than on a gap
    pub fn reached_limit(&self) -> bool {
        self.rounds.last().is_some_and(DiscoveryRound::has_content)
    }
}

impl MultichainProviderAggregator {
    /// Probe one group index across all providers concurrently
    pub async fn discover_group(
        &self,
        options: &GroupIndexOptions,
        abort_on_provider_error: bool,
    ) -> Result<DiscoveryRound, AccountApiError> {
        let outcomes = join_all(
            self.providers()
                .iter()
                .map(|provider| provider.discover_and_create_accounts(options)),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (index, (provider, outcome)) in self.providers().iter().zip(outcomes).enumerate() {
            let (accounts, error) = match outcome {
                Ok(accounts) => {
                    self.observe(index, &accounts);
                    (accounts, None)
                }
                Err(source) if abort_on_provider_error => {
                    return Err(AccountApiError::Provider {
                        provider: provider.name().to_string(),
                        source,
                    });
                }
                Err(source) => {
                    warn!(
                        provider = provider.name(),
                        group_index = options.group_index,
                        error = %source,
                        "Discovery failed, treating namespace as empty"
                    );
                    (Vec::new(), Some(source.to_string()))
                }
            };
            results.push(ProviderDiscovery {
                provider: provider.name().to_string(),
                namespace: provider.namespace().to_string(),
                accounts,
                error,
            });
        }

        Ok(DiscoveryRound {
            group_index: options.group_index,
            results,
        })
    }

    pub async fn discover_and_create_accounts(
        &self,
        entropy_source: &EntropySourceId,
        config: &DiscoveryConfig,
    ) -> Result<DiscoveryReport, AccountApiError> {
        let last_group_index = config.last_group_index();
        if config.start_group_index > last_group_index {
            return Err(AccountApiError::Config(format!(
                "discovery.start_group_index {} is past the last group index {}",
                config.start_group_index, last_group_index
            )));
        }

        let mut report = DiscoveryReport {
            entropy_source: entropy_source.clone(),
            rounds: Vec::new(),
        };

        let mut next = Some(config.start_group_index);
        while let Some(group_index) = next.filter(|index| *index <= last_group_index) {
            let options = GroupIndexOptions::new(entropy_source.clone(), group_index);
            let round = self
                .discover_group(&options, config.abort_on_provider_error)
                .await?;
            let has_content = round.has_content();

            debug!(
                entropy_source = %entropy_source,
                group_index,
                accounts = round.accounts().count(),
                "Discovery round complete"
            );
            report.rounds.push(round);

            if !has_content {
                break;
            }
            next = group_index.checked_add(1);
        }

        info!(
            entropy_source = %entropy_source,
            groups = report.discovered_group_indices().len(),
            accounts = report.accounts().len(),
            "Discovery finished"
        );
        Ok(report)
    }
}
