use serde_json::{json, Value};
use std::sync::Arc;

use crate::account::EntropySourceId;
use crate::config::DiscoveryConfig;
use crate::error::AccountApiError;
use crate::multichain::MultichainAccountWallet;
use crate::provider::{AccountProvider, InMemoryAccountProvider};
use crate::wallet::AccountGroup;

/// `namespace:groupIndex`, e.g. `solana:3`
fn parse_activity(entry: &str) -> Result<(String, u32), AccountApiError> {
    let invalid = || {
        AccountApiError::InvalidArgument(format!(
            "invalid activity '{}', expected namespace:index",
            entry
        ))
    };
    let (namespace, index) = entry.rsplit_once(':').ok_or_else(invalid)?;
    let index = index.parse().map_err(|_| invalid())?;
    Ok((namespace.to_string(), index))
}

pub async fn handle_discover_command(
    entropy_source: &str,
    active: &[String],
    config: DiscoveryConfig,
    align: bool,
) -> Result<Value, AccountApiError> {
    let entropy_source = EntropySourceId::new(entropy_source)?;

    let providers = [
        InMemoryAccountProvider::evm(),
        InMemoryAccountProvider::solana(),
        InMemoryAccountProvider::bitcoin(),
    ];
    for entry in active {
        let (namespace, index) = parse_activity(entry)?;
        let provider = providers
            .iter()
            .find(|p| p.namespace() == namespace)
            .ok_or_else(|| {
                let message = format!("no provider for namespace '{}'", namespace);
                AccountApiError::InvalidArgument(message)
            })?;
        provider.record_activity(&entropy_source, index);
    }

    let providers: Vec<Arc<dyn AccountProvider>> = providers
        .into_iter()
        .map(|p| Arc::new(p) as Arc<dyn AccountProvider>)
        .collect();
    let wallet = MultichainAccountWallet::new(entropy_source, providers).with_config(config);

    let report = wallet.discover_and_create_accounts().await?;
    let aligned = if align { wallet.align_groups().await } else { 0 };

    let groups: Vec<Value> = wallet
        .get_multichain_account_groups()
        .iter()
        .map(|group| {
            json!({
                "id": group.id(),
                "groupIndex": group.group_index(),
                "aligned": group.is_aligned(),
                "accounts": group.get_accounts().iter().map(|account| json!({
                    "id": account.id(),
                    "type": account.account().account_type,
                    "address": account.account().address,
                    "derivationPath": account.entropy().derivation_path,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    Ok(json!({
        "walletId": wallet.multichain_id(),
        "discoveredGroupIndices": report.discovered_group_indices(),
        "reachedLimit": report.reached_limit(),
        "rounds": report.rounds,
        "alignedAccounts": aligned,
        "groups": groups,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activity() {
        assert_eq!(parse_activity("eip155:3").unwrap(), ("eip155".to_string(), 3));
        assert!(parse_activity("eip155").is_err());
        assert!(parse_activity("eip155:x").is_err());
    }

    #[tokio::test]
    async fn test_discover_command() {
        let active = vec![
            "eip155:0".to_string(),
            "eip155:1".to_string(),
            "solana:0".to_string(),
        ];

        let out = handle_discover_command("seed", &active, DiscoveryConfig::default(), false)
            .await
            .unwrap();

        assert_eq!(out["walletId"], "entropy:seed");
        assert_eq!(out["discoveredGroupIndices"], json!([0, 1]));
        assert_eq!(out["groups"][0]["id"], "entropy:seed:0");
        assert_eq!(out["groups"][0]["accounts"].as_array().unwrap().len(), 2);
        assert_eq!(out["groups"][1]["aligned"], false);
        assert_eq!(out["alignedAccounts"], 0);
    }

    #[tokio::test]
    async fn test_discover_command_with_alignment() {
        let active = vec!["bip122:0".to_string()];

        let out = handle_discover_command("seed", &active, DiscoveryConfig::default(), true)
            .await
            .unwrap();

        assert_eq!(out["alignedAccounts"], 2);
        assert_eq!(out["groups"][0]["aligned"], true);
        assert_eq!(
            out["groups"][0]["accounts"][0]["derivationPath"],
            "m/44'/60'/0'/0/0"
        );
    }

    #[tokio::test]
    async fn test_discover_command_rejects_unknown_namespace() {
        let active = vec!["cosmos:0".to_string()];
        let err = handle_discover_command("seed", &active, DiscoveryConfig::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountApiError::InvalidArgument(_)));
    }
}
