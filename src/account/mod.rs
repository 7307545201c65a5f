//! Keyring accounts and their BIP-44 view
//!
//! - Account, account id and entropy source types
//! - Structural BIP-44 compatibility predicate
//! - Selectors over group members

pub mod bip44;
pub mod selector;
pub mod types;

pub use bip44::{
    assert_is_bip44_account, bip44_derivation_path, is_bip44_account, is_bip44_options,
    Bip44Account, Bip44Entropy,
};
pub use selector::AccountSelector;
pub use types::{AccountId, EntropySourceId, KeyringAccount, KeyringAccountType};
