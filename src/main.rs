use clap::Parser;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use multichain_accounts::cli::{self, Cli, Commands};
use multichain_accounts::config::AccountsConfig;

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AccountsConfig::load_or_default(path),
        None => AccountsConfig::default(),
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!(?config, "Configuration resolved");

    let output = match cli.command {
        Commands::WalletId {
            wallet_type,
            discriminator,
        } => cli::ids::handle_wallet_id(&wallet_type, &discriminator)?,
        Commands::GroupId {
            wallet,
            unique,
            index,
            default,
        } => cli::ids::handle_group_id(&wallet, unique.as_deref(), index, default)?,
        Commands::Parse { id, group } => cli::ids::handle_parse(&id, group)?,
        Commands::CheckAccount { path } => cli::ids::handle_check_account(&path)?,
        Commands::Discover {
            entropy_source,
            active,
            start,
            max,
            align,
        } => {
            let mut discovery = config.discovery.clone();
            if let Some(start) = start {
                discovery.start_group_index = start;
            }
            if max.is_some() {
                discovery.max_group_index = max;
            }
            cli::discover::handle_discover_command(&entropy_source, &active, discovery, align)
                .await?
        }
    };

    print_json(&output)
}
