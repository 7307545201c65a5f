pub mod discover;
pub mod ids;

use clap::{ArgGroup, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "keyring-accounts")]
#[command(about = "Multichain account identifiers and discovery", long_about = None)]
pub struct Cli {
    /// TOML configuration file, created with defaults when missing
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an account wallet id
    WalletId {
        /// entropy, keyring or snap
        #[arg(long = "type")]
        wallet_type: String,
        #[arg(long)]
        discriminator: String,
    },
    /// Build an account group id inside a wallet
    #[command(group(ArgGroup::new("target").required(true).args(["unique", "index", "default"])))]
    GroupId {
        #[arg(long)]
        wallet: String,
        /// Generic group unique id
        #[arg(long)]
        unique: Option<String>,
        /// Multichain group index (entropy wallets only)
        #[arg(long)]
        index: Option<u32>,
        /// The wallet's default group
        #[arg(long)]
        default: bool,
    },
    /// Break a wallet or group id into its components
    Parse {
        id: String,
        /// Parse as a group id instead of a wallet id
        #[arg(long)]
        group: bool,
    },
    /// Check whether a keyring account (JSON file) is BIP-44 compatible
    CheckAccount { path: String },
    /// Run gap-terminated discovery against simulated EVM, Solana and Bitcoin providers
    Discover {
        #[arg(long)]
        entropy_source: String,
        /// On-chain activity as namespace:groupIndex, e.g. eip155:0 (repeatable)
        #[arg(long = "active")]
        active: Vec<String>,
        /// Overrides discovery.start_group_index
        #[arg(long)]
        start: Option<u32>,
        /// Overrides discovery.max_group_index
        #[arg(long)]
        max: Option<u32>,
        /// Fill namespaces missing from discovered groups afterwards
        #[arg(long)]
        align: bool,
    },
}
