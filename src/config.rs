use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AccountApiError;

/// Highest non-hardened BIP-44 index, discovery never probes past it
pub const MAX_BIP44_GROUP_INDEX: u32 = 0x7fff_ffff;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct AccountsConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct DiscoveryConfig {
    /// First group index probed
    #[serde(default)]
    pub start_group_index: u32,
    /// Optional cap on the last probed index
    #[serde(default)]
    pub max_group_index: Option<u32>,
    /// Abort the whole run when one provider fails, instead of counting it as empty
    #[serde(default)]
    pub abort_on_provider_error: bool,
}

impl DiscoveryConfig {
    pub fn last_group_index(&self) -> u32 {
        self.max_group_index
            .unwrap_or(MAX_BIP44_GROUP_INDEX)
            .min(MAX_BIP44_GROUP_INDEX)
    }
}

impl AccountsConfig {
    pub fn load(path: &str) -> Result<Self, AccountApiError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AccountApiError::Config(format!("{}: {}", path, e)))?;
        toml::from_str(&contents).map_err(|e| AccountApiError::Config(format!("{}: {}", path, e)))
    }

    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match Self::load(path) {
                Ok(config) => {
                    info!("Config loaded from {}", path);
                    config
                }
                Err(e) => {
                    warn!("{}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                if let Err(e) = std::fs::write(path, s) {
                    warn!("Could not write default config to {}: {}", path, e);
                }
            }
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config: AccountsConfig = toml::from_str(
            r#"
            [discovery]
            max_group_index = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.log_level, "info");
        assert_eq!(config.discovery.start_group_index, 0);
        assert_eq!(config.discovery.max_group_index, Some(20));
        assert!(!config.discovery.abort_on_provider_error);
    }

    #[test]
    fn test_last_group_index_is_clamped() {
        let uncapped = DiscoveryConfig::default();
        assert_eq!(uncapped.last_group_index(), MAX_BIP44_GROUP_INDEX);

        let capped = DiscoveryConfig {
            max_group_index: Some(u32::MAX),
            ..Default::default()
        };
        assert_eq!(capped.last_group_index(), MAX_BIP44_GROUP_INDEX);

        let small = DiscoveryConfig {
            max_group_index: Some(5),
            ..Default::default()
        };
        assert_eq!(small.last_group_index(), 5);
    }

    #[test]
    fn test_load_or_default_writes_default_file() {
        let path = std::env::temp_dir().join(format!("accounts-{}.toml", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();

        let config = AccountsConfig::load_or_default(&path);
        assert_eq!(config, AccountsConfig::default());

        let reloaded = AccountsConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let path = std::env::temp_dir().join(format!("accounts-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[discovery]\nstart_group_index = \"zero\"\n").unwrap();

        let result = AccountsConfig::load(&path.to_string_lossy());
        assert!(matches!(result, Err(AccountApiError::Config(_))));

        let _ = std::fs::remove_file(&path);
    }
}
