//! BIP-44 compatibility of keyring accounts.
//!
//! An account is BIP-44 compatible when its `options.entropy` object reads
//!
//! ```json
//! {
//!   "type": "mnemonic",
//!   "id": "<entropy source>",
//!   "groupIndex": 0,
//!   "derivationPath": "m/44'/60'/0'/0/0"
//! }
//! ```
//!
//! The check is structural: any account type qualifies, extra fields are
//! ignored, and every one of the four fields must be present and well typed.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::types::{AccountId, EntropySourceId, KeyringAccount, KeyringAccountType};
use crate::error::AccountApiError;

pub const ENTROPY_OPTIONS_KEY: &str = "entropy";
pub const MNEMONIC_ENTROPY_TYPE: &str = "mnemonic";

/// Entropy options of a BIP-44 account
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Bip44Entropy {
    pub id: EntropySourceId,
    pub group_index: u32,
    pub derivation_path: String,
}

impl Bip44Entropy {
    /// Read the entropy options, `None` on any missing or mistyped field
    pub fn from_options(options: &Map<String, Value>) -> Option<Self> {
        let entropy = options.get(ENTROPY_OPTIONS_KEY)?.as_object()?;

        if entropy.get("type")?.as_str()? != MNEMONIC_ENTROPY_TYPE {
            return None;
        }
        let id = EntropySourceId::new(entropy.get("id")?.as_str()?).ok()?;
        // as_u64 is None for negative and fractional numbers
        let group_index = u32::try_from(entropy.get("groupIndex")?.as_u64()?).ok()?;
        let derivation_path = entropy.get("derivationPath")?.as_str()?.to_string();

        Some(Self {
            id,
            group_index,
            derivation_path,
        })
    }

    pub fn to_value(&self) -> Value {
        json!({
            "type": MNEMONIC_ENTROPY_TYPE,
            "id": self.id.as_str(),
            "groupIndex": self.group_index,
            "derivationPath": self.derivation_path,
        })
    }
}

pub fn is_bip44_options(options: &Map<String, Value>) -> bool {
    Bip44Entropy::from_options(options).is_some()
}

pub fn is_bip44_account(account: &KeyringAccount) -> bool {
    is_bip44_options(&account.options)
}

pub fn assert_is_bip44_account(account: &KeyringAccount) -> Result<(), AccountApiError> {
    if is_bip44_account(account) {
        Ok(())
    } else {
        Err(AccountApiError::NotBip44Account {
            account_id: account.id.to_string(),
        })
    }
}

/// Default derivation path of a namespace's account at `group_index`
pub fn bip44_derivation_path(namespace: &str, group_index: u32) -> String {
    match namespace {
        "solana" => format!("m/44'/501'/{}'/0'", group_index),
        "bip122" => format!("m/84'/0'/{}'/0/0", group_index),
        "tron" => format!("m/44'/195'/0'/0/{}", group_index),
        _ => format!("m/44'/60'/0'/0/{}", group_index),
    }
}

/// A keyring account narrowed to the BIP-44 shape
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "KeyringAccount", into = "KeyringAccount")]
pub struct Bip44Account {
    account: KeyringAccount,
    entropy: Bip44Entropy,
}

impl Bip44Account {
    /// Build an account whose options carry the given entropy
    pub fn new(
        id: AccountId,
        account_type: KeyringAccountType,
        address: String,
        scopes: Vec<String>,
        methods: Vec<String>,
        entropy: Bip44Entropy,
    ) -> Self {
        let mut options = Map::new();
        options.insert(ENTROPY_OPTIONS_KEY.to_string(), entropy.to_value());

        Self {
            account: KeyringAccount {
                id,
                account_type,
                address,
                scopes,
                options,
                methods,
            },
            entropy,
        }
    }

    pub fn id(&self) -> AccountId {
        self.account.id
    }

    pub fn account(&self) -> &KeyringAccount {
        &self.account
    }

    pub fn entropy(&self) -> &Bip44Entropy {
        &self.entropy
    }

    pub fn entropy_source(&self) -> &EntropySourceId {
        &self.entropy.id
    }

    pub fn group_index(&self) -> u32 {
        self.entropy.group_index
    }

    pub fn namespace(&self) -> &str {
        self.account.namespace()
    }

    pub fn into_inner(self) -> KeyringAccount {
        self.account
    }
}

impl TryFrom<KeyringAccount> for Bip44Account {
    type Error = AccountApiError;

    fn try_from(account: KeyringAccount) -> Result<Self, Self::Error> {
        match Bip44Entropy::from_options(&account.options) {
            Some(entropy) => Ok(Self { account, entropy }),
            None => Err(AccountApiError::NotBip44Account {
                account_id: account.id.to_string(),
            }),
        }
    }
}

impl From<Bip44Account> for KeyringAccount {
    fn from(account: Bip44Account) -> Self {
        account.account
    }
}

impl AsRef<KeyringAccount> for Bip44Account {
    fn as_ref(&self) -> &KeyringAccount {
        &self.account
    }
}
