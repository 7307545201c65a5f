use serde::{Deserialize, Serialize};

use super::types::{AccountId, KeyringAccount, KeyringAccountType};

/// EVM accounts usually carry this scope to mean "every EVM chain"
pub const EVM_WILDCARD_SCOPE: &str = "eip155:0";

/// Filter over the accounts of a group. Unset fields match anything.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AccountSelector {
    #[serde(default)]
    pub id: Option<AccountId>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "type")]
    pub account_type: Option<KeyringAccountType>,
    /// Every listed method must be supported
    #[serde(default)]
    pub methods: Option<Vec<String>>,
    /// Every listed scope must be covered
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

impl AccountSelector {
    pub fn matches(&self, account: &KeyringAccount) -> bool {
        if self.id.is_some_and(|id| id != account.id) {
            return false;
        }
        if let Some(address) = &self.address {
            if !address.eq_ignore_ascii_case(&account.address) {
                return false;
            }
        }
        if let Some(account_type) = &self.account_type {
            if account_type != &account.account_type {
                return false;
            }
        }
        if let Some(methods) = &self.methods {
            if !methods.iter().all(|m| account.supports_method(m)) {
                return false;
            }
        }
        if let Some(scopes) = &self.scopes {
            if !scopes.iter().all(|scope| covers_scope(account, scope)) {
                return false;
            }
        }
        true
    }
}

fn covers_scope(account: &KeyringAccount, scope: &str) -> bool {
    account.scopes.iter().any(|owned| {
        owned == scope || (owned == EVM_WILDCARD_SCOPE && scope.starts_with("eip155:"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn evm_account() -> KeyringAccount {
        KeyringAccount {
            id: AccountId::random(),
            account_type: KeyringAccountType::Eip155Eoa,
            address: "0xAbC0000000000000000000000000000000000001".to_string(),
            scopes: vec![EVM_WILDCARD_SCOPE.to_string()],
            options: Map::new(),
            methods: vec!["personal_sign".to_string(), "eth_signTransaction".to_string()],
        }
    }

    #[test]
    fn test_empty_selector_matches_all() {
        assert!(AccountSelector::default().matches(&evm_account()));
    }

    #[test]
    fn test_selector_fields() {
        let account = evm_account();

        let by_id = AccountSelector { id: Some(account.id), ..Default::default() };
        assert!(by_id.matches(&account));
        let other_id = AccountSelector { id: Some(AccountId::random()), ..Default::default() };
        assert!(!other_id.matches(&account));

        let by_address = AccountSelector {
            address: Some(account.address.to_lowercase()),
            ..Default::default()
        };
        assert!(by_address.matches(&account));

        let by_type = AccountSelector {
            account_type: Some(KeyringAccountType::SolanaDataAccount),
            ..Default::default()
        };
        assert!(!by_type.matches(&account));

        let by_methods = AccountSelector {
            methods: Some(vec!["personal_sign".to_string(), "eth_sign".to_string()]),
            ..Default::default()
        };
        assert!(!by_methods.matches(&account));
    }

    #[test]
    fn test_evm_wildcard_scope() {
        let account = evm_account();

        let mainnet = AccountSelector {
            scopes: Some(vec!["eip155:1".to_string(), "eip155:137".to_string()]),
            ..Default::default()
        };
        assert!(mainnet.matches(&account));

        let solana = AccountSelector {
            scopes: Some(vec!["solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp".to_string()]),
            ..Default::default()
        };
        assert!(!solana.matches(&account));
    }
}
