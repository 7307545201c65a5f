use serde_json::{json, Value};

use crate::account::{assert_is_bip44_account, Bip44Entropy, KeyringAccount};
use crate::error::AccountApiError;
use crate::ids::{
    parse_account_group_id, parse_account_wallet_id, to_account_group_id, to_account_wallet_id,
    to_default_account_group_id, to_multichain_account_group_id, AccountWalletId,
    MultichainAccountWalletId,
};
use crate::wallet::AccountWalletType;

pub fn handle_wallet_id(wallet_type: &str, discriminator: &str) -> Result<Value, AccountApiError> {
    let wallet_type: AccountWalletType = wallet_type.parse()?;
    let id = to_account_wallet_id(wallet_type, discriminator)?;
    Ok(json!({ "id": id, "type": wallet_type }))
}

pub fn handle_group_id(
    wallet: &str,
    unique: Option<&str>,
    index: Option<u32>,
    default: bool,
) -> Result<Value, AccountApiError> {
    let wallet_id: AccountWalletId = wallet.parse()?;

    let group_id = match (unique, index, default) {
        (Some(unique), None, false) => to_account_group_id(&wallet_id, unique)?,
        (None, Some(index), false) => {
            let wallet_id = MultichainAccountWalletId::try_from(wallet_id)?;
            to_multichain_account_group_id(&wallet_id, index).into()
        }
        (None, None, true) => to_default_account_group_id(&wallet_id),
        _ => {
            return Err(AccountApiError::InvalidArgument(
                "expected exactly one of --unique, --index or --default".to_string(),
            ))
        }
    };

    Ok(json!({
        "id": group_id,
        "walletId": group_id.wallet_id(),
        "type": group_id.group_type(),
        "discriminator": group_id.discriminator(),
    }))
}

pub fn handle_parse(id: &str, group: bool) -> Result<Value, AccountApiError> {
    if group {
        let parsed = parse_account_group_id(id)?;
        Ok(json!({
            "walletId": parsed.wallet_id,
            "walletType": parsed.wallet.wallet_type,
            "walletDiscriminator": parsed.wallet.discriminator,
            "type": parsed.group_type(),
            "discriminator": parsed.discriminator,
        }))
    } else {
        let parsed = parse_account_wallet_id(id)?;
        Ok(json!({
            "walletType": parsed.wallet_type,
            "discriminator": parsed.discriminator,
        }))
    }
}

/// Report on a serialized account. Malformed JSON is an error, an account
/// that simply lacks BIP-44 entropy is reported as incompatible.
pub fn handle_check_account(path: &str) -> Result<Value, AccountApiError> {
    let contents = std::fs::read_to_string(path)?;
    let account: KeyringAccount = serde_json::from_str(&contents)
        .map_err(|e| AccountApiError::Deserialization(format!("{}: {}", path, e)))?;

    Ok(match assert_is_bip44_account(&account) {
        Ok(()) => {
            let entropy = Bip44Entropy::from_options(&account.options);
            json!({
                "id": account.id,
                "bip44": true,
                "entropy": entropy.map(|e| e.to_value()),
            })
        }
        Err(e) => json!({
            "id": account.id,
            "bip44": false,
            "reason": e.to_string(),
        }),
    })
}
