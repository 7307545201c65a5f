//! Account type definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AccountApiError;
use crate::ids::ACCOUNT_ID_DELIMITER;

/// Account identifier - UUIDv4 assigned by the owning backend, never reused
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Fresh random (v4) account id
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque name of a root entropy source (e.g. a seed phrase record)
///
/// Must be non-empty and must not contain the id delimiter, otherwise the
/// wallet id built from it could be read back as a group id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct EntropySourceId(String);

impl EntropySourceId {
    pub fn new(id: impl Into<String>) -> Result<Self, AccountApiError> {
        let id = id.into();
        if id.is_empty() || id.contains(ACCOUNT_ID_DELIMITER) {
            return Err(AccountApiError::InvalidEntropySource(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntropySourceId {
    type Error = AccountApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntropySourceId> for String {
    fn from(id: EntropySourceId) -> Self {
        id.0
    }
}

impl FromStr for EntropySourceId {
    type Err = AccountApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for EntropySourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntropySourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chain-specific account shape, tagged `<namespace>:<kind>`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum KeyringAccountType {
    Eip155Eoa,
    Eip155Erc4337,
    Bip122P2wpkh,
    SolanaDataAccount,
    TronEoa,
    /// Any account type this crate does not know by name
    Other(String),
}

impl KeyringAccountType {
    pub fn as_str(&self) -> &str {
        match self {
            KeyringAccountType::Eip155Eoa => "eip155:eoa",
            KeyringAccountType::Eip155Erc4337 => "eip155:erc4337",
            KeyringAccountType::Bip122P2wpkh => "bip122:p2wpkh",
            KeyringAccountType::SolanaDataAccount => "solana:data-account",
            KeyringAccountType::TronEoa => "tron:eoa",
            KeyringAccountType::Other(other) => other,
        }
    }

    /// CAIP-2 namespace of the account type (`eip155`, `solana`, ...)
    pub fn namespace(&self) -> &str {
        let tag = self.as_str();
        tag.split_once(':').map(|(ns, _)| ns).unwrap_or(tag)
    }
}

impl From<String> for KeyringAccountType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "eip155:eoa" => KeyringAccountType::Eip155Eoa,
            "eip155:erc4337" => KeyringAccountType::Eip155Erc4337,
            "bip122:p2wpkh" => KeyringAccountType::Bip122P2wpkh,
            "solana:data-account" => KeyringAccountType::SolanaDataAccount,
            "tron:eoa" => KeyringAccountType::TronEoa,
            _ => KeyringAccountType::Other(value),
        }
    }
}

impl From<KeyringAccountType> for String {
    fn from(value: KeyringAccountType) -> Self {
        match value {
            KeyringAccountType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for KeyringAccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account as exposed by a keyring backend
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyringAccount {
    pub id: AccountId,
    #[serde(rename = "type")]
    pub account_type: KeyringAccountType,
    pub address: String,
    /// CAIP-2 chain ids the account can operate on
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Backend-specific options, BIP-44 accounts carry `options.entropy`
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl KeyringAccount {
    pub fn namespace(&self) -> &str {
        self.account_type.namespace()
    }

    pub fn supports_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entropy_source_validation() {
        assert!(EntropySourceId::new("01JX9ZRQ5B0V").is_ok());
        assert!(EntropySourceId::new("").is_err());
        assert!(EntropySourceId::new(":leading").is_err());
        assert!(EntropySourceId::new("a:1").is_err());
        assert!(EntropySourceId::new("trailing:").is_err());

        let parsed: Result<EntropySourceId, _> = serde_json::from_value(json!(""));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_account_type_namespace() {
        assert_eq!(KeyringAccountType::Eip155Erc4337.namespace(), "eip155");
        assert_eq!(KeyringAccountType::SolanaDataAccount.namespace(), "solana");
        assert_eq!(
            KeyringAccountType::from("cosmos:secp256k1".to_string()).namespace(),
            "cosmos"
        );
        assert_eq!(KeyringAccountType::Other("opaque".to_string()).namespace(), "opaque");
    }

    #[test]
    fn test_account_deserialize() {
        let id = AccountId::random();
        let account: KeyringAccount = serde_json::from_value(json!({
            "id": id.to_string(),
            "type": "eip155:eoa",
            "address": "0x1234",
            "scopes": ["eip155:0"],
            "options": {},
            "methods": ["personal_sign"],
        }))
        .unwrap();

        assert_eq!(account.id, id);
        assert_eq!(account.account_type, KeyringAccountType::Eip155Eoa);
        assert_eq!(account.namespace(), "eip155");
        assert!(account.supports_method("personal_sign"));
        assert!(!account.supports_method("eth_signTypedData_v4"));

        let back = serde_json::to_value(&account).unwrap();
        assert_eq!(back["type"], "eip155:eoa");
    }
}
