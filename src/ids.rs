//! Wallet and account group identifiers.
//!
//! Identifiers are plain strings on the wire and in storage:
//!
//! - wallet: `<walletType>:<discriminator>`, e.g. `entropy:01JX..`, `snap:npm:@acme/snap`
//! - group: `<walletId>:<groupDiscriminator>`, e.g. `entropy:01JX..:0`,
//!   `keyring:HD Key Tree:default`
//!
//! The wallet type is everything before the first `:` of a wallet id. Entropy
//! and keyring discriminators never contain `:`. Snap discriminators are snap
//! ids, `npm:<name>` or `local:<name>`, with exactly one `:` after the source.
//! A wallet id therefore never parses as a group id, and the group
//! discriminator is everything after the *last* `:` of a group id. A group id
//! always starts with its wallet id.
//!
//! Group discriminators are one of:
//! - the reserved `default` sentinel,
//! - a canonical decimal group index (only on `entropy` wallets),
//! - any other unique id. Unique ids that are all digits are rejected so a
//!   generic group can never be mistaken for a multichain one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::account::EntropySourceId;
use crate::error::AccountApiError;
use crate::wallet::{AccountGroupType, AccountWalletType, GroupDiscriminator};

pub const ACCOUNT_ID_DELIMITER: char = ':';

/// Group discriminator of wallets that do not (yet) distinguish groups
pub const DEFAULT_ACCOUNT_GROUP_UNIQUE_ID: &str = "default";

/// Components of a wallet id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParsedAccountWalletId {
    pub wallet_type: AccountWalletType,
    pub discriminator: String,
}

/// Components of a group id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParsedAccountGroupId {
    pub wallet_id: AccountWalletId,
    pub wallet: ParsedAccountWalletId,
    pub discriminator: GroupDiscriminator,
}

impl ParsedAccountGroupId {
    pub fn group_type(&self) -> AccountGroupType {
        self.discriminator.group_type()
    }
}

pub fn parse_account_wallet_id(id: &str) -> Result<ParsedAccountWalletId, AccountApiError> {
    let (tag, discriminator) = id
        .split_once(ACCOUNT_ID_DELIMITER)
        .ok_or_else(|| AccountApiError::InvalidWalletId(id.to_string()))?;
    let wallet_type: AccountWalletType = tag.parse()?;

    if !is_valid_wallet_discriminator(wallet_type, discriminator) {
        return Err(AccountApiError::InvalidWalletId(id.to_string()));
    }

    Ok(ParsedAccountWalletId {
        wallet_type,
        discriminator: discriminator.to_string(),
    })
}

pub fn parse_account_group_id(id: &str) -> Result<ParsedAccountGroupId, AccountApiError> {
    let invalid = || AccountApiError::InvalidGroupId(id.to_string());

    let (wallet_part, suffix) = id.rsplit_once(ACCOUNT_ID_DELIMITER).ok_or_else(invalid)?;
    let wallet = parse_account_wallet_id(wallet_part).map_err(|_| invalid())?;
    let discriminator = classify_group_suffix(wallet.wallet_type, suffix).ok_or_else(invalid)?;

    Ok(ParsedAccountGroupId {
        wallet_id: AccountWalletId {
            id: wallet_part.to_string(),
            wallet_type: wallet.wallet_type,
        },
        wallet,
        discriminator,
    })
}

fn classify_group_suffix(
    wallet_type: AccountWalletType,
    suffix: &str,
) -> Option<GroupDiscriminator> {
    if suffix.is_empty() {
        return None;
    }
    if suffix == DEFAULT_ACCOUNT_GROUP_UNIQUE_ID {
        return Some(GroupDiscriminator::Default);
    }
    if is_all_digits(suffix) {
        // Numeric suffixes are reserved for multichain group indices
        return match (wallet_type, parse_group_index(suffix)) {
            (AccountWalletType::Entropy, Some(index)) => Some(GroupDiscriminator::Index(index)),
            _ => None,
        };
    }
    Some(GroupDiscriminator::Unique(suffix.to_string()))
}

/// Sources a snap id can name, as in `npm:@metamask/solana-wallet-snap`
const SNAP_ID_SOURCES: [&str; 2] = ["npm", "local"];

fn is_valid_wallet_discriminator(wallet_type: AccountWalletType, discriminator: &str) -> bool {
    match wallet_type {
        AccountWalletType::Snap => discriminator
            .split_once(ACCOUNT_ID_DELIMITER)
            .is_some_and(|(source, name)| {
                SNAP_ID_SOURCES.contains(&source) && is_id_segment(name)
            }),
        AccountWalletType::Entropy | AccountWalletType::Keyring => is_id_segment(discriminator),
    }
}

/// Non-empty and free of the delimiter
fn is_id_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains(ACCOUNT_ID_DELIMITER)
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Canonical decimal only: no sign, no leading zeros (except `0` itself).
fn parse_group_index(s: &str) -> Option<u32> {
    if !is_all_digits(s) || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    s.parse().ok()
}

/// `<walletType>:<discriminator>`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct AccountWalletId {
    id: String,
    wallet_type: AccountWalletType,
}

impl AccountWalletId {
    fn from_string(id: String) -> Result<Self, AccountApiError> {
        let parsed = parse_account_wallet_id(&id)?;
        Ok(Self {
            id,
            wallet_type: parsed.wallet_type,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn wallet_type(&self) -> AccountWalletType {
        self.wallet_type
    }

    pub fn discriminator(&self) -> &str {
        &self.id[self.wallet_type.as_str().len() + 1..]
    }
}

/// `<walletId>:<groupDiscriminator>`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct AccountGroupId {
    id: String,
    wallet_id: AccountWalletId,
    discriminator: GroupDiscriminator,
}

impl AccountGroupId {
    fn from_string(id: String) -> Result<Self, AccountApiError> {
        let parsed = parse_account_group_id(&id)?;
        Ok(Self {
            id,
            wallet_id: parsed.wallet_id,
            discriminator: parsed.discriminator,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Owning wallet id, a prefix strip
    pub fn wallet_id(&self) -> &AccountWalletId {
        &self.wallet_id
    }

    pub fn belongs_to(&self, wallet_id: &AccountWalletId) -> bool {
        &self.wallet_id == wallet_id
    }

    pub fn discriminator(&self) -> &GroupDiscriminator {
        &self.discriminator
    }

    pub fn group_type(&self) -> AccountGroupType {
        self.discriminator.group_type()
    }

    pub fn is_default(&self) -> bool {
        self.discriminator == GroupDiscriminator::Default
    }
}

/// Wallet id of an entropy-backed (multichain) wallet
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct MultichainAccountWalletId {
    id: String,
    entropy_source: EntropySourceId,
}

impl MultichainAccountWalletId {
    fn from_string(id: String) -> Result<Self, AccountApiError> {
        match parse_account_wallet_id(&id) {
            Ok(ParsedAccountWalletId {
                wallet_type: AccountWalletType::Entropy,
                discriminator,
            }) => Ok(Self {
                entropy_source: EntropySourceId::new(discriminator)?,
                id,
            }),
            _ => Err(AccountApiError::InvalidWalletId(id)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn entropy_source(&self) -> &EntropySourceId {
        &self.entropy_source
    }
}

/// Group id of a multichain account group: an entropy wallet id plus a group index
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct MultichainAccountGroupId {
    id: String,
    wallet_id: MultichainAccountWalletId,
    group_index: u32,
}

impl MultichainAccountGroupId {
    fn from_string(id: String) -> Result<Self, AccountApiError> {
        let group_index = get_group_index_from_multichain_account_group_id(&id)?;
        let (wallet, _) = id
            .rsplit_once(ACCOUNT_ID_DELIMITER)
            .ok_or_else(|| AccountApiError::GroupIndexExtraction(id.clone()))?;
        let wallet_id = MultichainAccountWalletId::from_string(wallet.to_string())?;
        Ok(Self {
            id,
            wallet_id,
            group_index,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn wallet_id(&self) -> &MultichainAccountWalletId {
        &self.wallet_id
    }

    pub fn group_index(&self) -> u32 {
        self.group_index
    }
}

macro_rules! impl_id_string {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = AccountApiError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $ty::from_string(value)
            }
        }

        impl FromStr for $ty {
            type Err = AccountApiError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::from_string(s.to_string())
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.id
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.id
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.id)
            }
        }
    };
}

impl_id_string!(AccountWalletId);
impl_id_string!(AccountGroupId);
impl_id_string!(MultichainAccountWalletId);
impl_id_string!(MultichainAccountGroupId);

impl From<MultichainAccountWalletId> for AccountWalletId {
    fn from(id: MultichainAccountWalletId) -> Self {
        AccountWalletId {
            id: id.id,
            wallet_type: AccountWalletType::Entropy,
        }
    }
}

impl From<MultichainAccountGroupId> for AccountGroupId {
    fn from(id: MultichainAccountGroupId) -> Self {
        AccountGroupId {
            id: id.id,
            wallet_id: id.wallet_id.into(),
            discriminator: GroupDiscriminator::Index(id.group_index),
        }
    }
}

impl TryFrom<AccountGroupId> for MultichainAccountGroupId {
    type Error = AccountApiError;

    fn try_from(id: AccountGroupId) -> Result<Self, Self::Error> {
        Self::from_string(id.id)
    }
}

impl TryFrom<AccountWalletId> for MultichainAccountWalletId {
    type Error = AccountApiError;

    fn try_from(id: AccountWalletId) -> Result<Self, Self::Error> {
        Self::from_string(id.id)
    }
}

pub fn to_account_wallet_id(
    wallet_type: AccountWalletType,
    discriminator: &str,
) -> Result<AccountWalletId, AccountApiError> {
    AccountWalletId::try_from(format!(
        "{}{}{}",
        wallet_type, ACCOUNT_ID_DELIMITER, discriminator
    ))
}

/// Generic group id. The unique id must be non-empty, must not contain the
/// delimiter, and must not collide with the default sentinel or a group index.
pub fn to_account_group_id(
    wallet_id: &AccountWalletId,
    unique_id: &str,
) -> Result<AccountGroupId, AccountApiError> {
    let id = format!("{}{}{}", wallet_id, ACCOUNT_ID_DELIMITER, unique_id);
    if unique_id.is_empty()
        || unique_id.contains(ACCOUNT_ID_DELIMITER)
        || unique_id == DEFAULT_ACCOUNT_GROUP_UNIQUE_ID
        || is_all_digits(unique_id)
    {
        return Err(AccountApiError::InvalidGroupId(id));
    }
    Ok(AccountGroupId {
        id,
        wallet_id: wallet_id.clone(),
        discriminator: GroupDiscriminator::Unique(unique_id.to_string()),
    })
}

pub fn to_default_account_group_id(wallet_id: &AccountWalletId) -> AccountGroupId {
    AccountGroupId {
        id: format!(
            "{}{}{}",
            wallet_id, ACCOUNT_ID_DELIMITER, DEFAULT_ACCOUNT_GROUP_UNIQUE_ID
        ),
        wallet_id: wallet_id.clone(),
        discriminator: GroupDiscriminator::Default,
    }
}

pub fn to_multichain_account_wallet_id(
    entropy_source: &EntropySourceId,
) -> MultichainAccountWalletId {
    MultichainAccountWalletId {
        id: format!(
            "{}{}{}",
            AccountWalletType::Entropy,
            ACCOUNT_ID_DELIMITER,
            entropy_source
        ),
        entropy_source: entropy_source.clone(),
    }
}

pub fn to_multichain_account_group_id(
    wallet_id: &MultichainAccountWalletId,
    group_index: u32,
) -> MultichainAccountGroupId {
    MultichainAccountGroupId {
        id: format!("{}{}{}", wallet_id, ACCOUNT_ID_DELIMITER, group_index),
        wallet_id: wallet_id.clone(),
        group_index,
    }
}

pub fn is_multichain_account_wallet_id(id: &str) -> bool {
    matches!(
        parse_account_wallet_id(id),
        Ok(ParsedAccountWalletId { wallet_type: AccountWalletType::Entropy, .. })
    )
}

pub fn is_multichain_account_group_id(id: &str) -> bool {
    matches!(
        parse_account_group_id(id),
        Ok(ParsedAccountGroupId { discriminator: GroupDiscriminator::Index(_), .. })
    )
}

pub fn get_group_index_from_multichain_account_group_id(
    id: impl AsRef<str>,
) -> Result<u32, AccountApiError> {
    let id = id.as_ref();
    match parse_account_group_id(id) {
        Ok(ParsedAccountGroupId {
            discriminator: GroupDiscriminator::Index(index),
            ..
        }) => Ok(index),
        _ => Err(AccountApiError::GroupIndexExtraction(id.to_string())),
    }
}
