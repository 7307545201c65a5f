use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum AccountApiError {
    #[error("Invalid account wallet id: {0}")]
    InvalidWalletId(String),
    #[error("Invalid account group id: {0}")]
    InvalidGroupId(String),
    #[error("Invalid entropy source id: {0:?}")]
    InvalidEntropySource(String),
    #[error("Unknown account wallet type: {0}")]
    UnknownWalletType(String),
    #[error("Unable to extract group index from: {0}")]
    GroupIndexExtraction(String),
    /// The account id is kept for diagnostics but never rendered, the message is fixed.
    #[error("Account is not BIP-44 compatible")]
    NotBip44Account { account_id: String },
    #[error("Group index {requested} is beyond the last BIP-44 group index {max}")]
    GroupIndexOutOfRange { requested: u32, max: u32 },
    #[error("Group index {requested} is out of sequence (next is {next})")]
    GroupIndexOutOfSequence { requested: u32, next: u32 },
    #[error("Provider '{provider}' failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid arguments: {0}")]
    InvalidArgument(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}
