//! Wallet and account group taxonomy.
//!
//! A wallet is the top-level grouping of every account sharing an origin:
//! one entropy source, one Snap, or one keyring type. Groups partition a
//! wallet's accounts. Both kinds are recoverable from an identifier alone,
//! see [`crate::ids`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::account::AccountId;
use crate::error::AccountApiError;
use crate::ids::{AccountGroupId, AccountWalletId};

/// Origin of the accounts held by a wallet
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum AccountWalletType {
    /// Accounts derived from a mnemonic (or other root secret)
    Entropy,
    /// Accounts held by a keyring, discriminated by keyring type
    Keyring,
    /// Accounts held by a Snap, discriminated by snap id
    Snap,
}

impl AccountWalletType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountWalletType::Entropy => "entropy",
            AccountWalletType::Keyring => "keyring",
            AccountWalletType::Snap => "snap",
        }
    }
}

impl fmt::Display for AccountWalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountWalletType {
    type Err = AccountApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entropy" => Ok(AccountWalletType::Entropy),
            "keyring" => Ok(AccountWalletType::Keyring),
            "snap" => Ok(AccountWalletType::Snap),
            other => Err(AccountApiError::UnknownWalletType(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AccountGroupType {
    /// Accounts sharing (entropy source, group index) across namespaces
    MultichainAccount,
    /// Any other grouping, usually one account per group
    SingleAccount,
}

impl AccountGroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountGroupType::MultichainAccount => "multichain-account",
            AccountGroupType::SingleAccount => "single-account",
        }
    }
}

impl fmt::Display for AccountGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suffix of a group id, after the owning wallet id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum GroupDiscriminator {
    /// Reserved sentinel for wallets that do not distinguish groups
    Default,
    /// BIP-44 group index of a multichain account group
    Index(u32),
    /// Opaque unique id of a generic group
    Unique(String),
}

impl GroupDiscriminator {
    pub fn group_type(&self) -> AccountGroupType {
        match self {
            GroupDiscriminator::Index(_) => AccountGroupType::MultichainAccount,
            GroupDiscriminator::Default | GroupDiscriminator::Unique(_) => {
                AccountGroupType::SingleAccount
            }
        }
    }

    pub fn group_index(&self) -> Option<u32> {
        match self {
            GroupDiscriminator::Index(index) => Some(*index),
            _ => None,
        }
    }
}

/// Read view over a group of accounts
pub trait AccountGroup {
    type Account;

    fn id(&self) -> AccountGroupId;

    fn group_type(&self) -> AccountGroupType;

    fn wallet_id(&self) -> AccountWalletId;

    /// Ids of every account in the group
    fn account_ids(&self) -> Vec<AccountId>;

    fn get_account(&self, id: &AccountId) -> Option<Self::Account>;
}

/// Read view over a wallet and its groups
pub trait AccountWallet {
    type Group: AccountGroup;

    fn id(&self) -> AccountWalletId;

    fn wallet_type(&self) -> AccountWalletType;

    fn get_account_group(&self, id: &AccountGroupId) -> Option<Self::Group>;

    fn get_account_groups(&self) -> Vec<Self::Group>;
}
