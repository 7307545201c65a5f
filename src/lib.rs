pub mod account;
pub mod cli;
pub mod config;
pub mod error;
pub mod ids;
mod locks;
pub mod multichain;
pub mod provider;
pub mod wallet;
