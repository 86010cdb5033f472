//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// RPC endpoint URL override.
pub const RPC_URL_ENV_VAR: &str = "WEB3_PROVIDER";
/// Deployed contract address override.
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "CONTRACT_ADDRESS";
/// ABI file path override.
pub const ABI_PATH_ENV_VAR: &str = "CONTRACT_ABI_PATH";
/// Listener bind address override.
pub const BIND_ADDRESS_ENV_VAR: &str = "BRIDGE_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => BridgeConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay values found by `lookup` onto `config`. Empty values are ignored.
pub fn apply_env_overrides<F>(mut config: BridgeConfig, lookup: F) -> BridgeConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(RPC_URL_ENV_VAR) {
        config.chain.rpc_url = url;
    }
    if let Some(address) = get(CONTRACT_ADDRESS_ENV_VAR) {
        config.chain.contract_address = address;
    }
    if let Some(path) = get(ABI_PATH_ENV_VAR) {
        config.chain.abi_path = path;
    }
    if let Some(bind) = get(BIND_ADDRESS_ENV_VAR) {
        config.listener.bind_address = bind;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("WEB3_PROVIDER", "https://eth-holesky.example/v2/key"),
            ("CONTRACT_ADDRESS", "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            ("BRIDGE_BIND_ADDRESS", ""),
        ]
        .into_iter()
        .collect();

        let config = apply_env_overrides(BridgeConfig::default(), |k| {
            env.get(k).map(|v| v.to_string())
        });

        assert_eq!(config.chain.rpc_url, "https://eth-holesky.example/v2/key");
        assert_eq!(
            config.chain.contract_address,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        // Empty values leave the default in place
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
        assert_eq!(config.chain.abi_path, "abi/ZipTalesABI.json");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_config(Some(Path::new("does/not/exist.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let path = std::env::temp_dir().join("ziptales_bridge_bad_config.toml");
        fs::write(&path, "[chain\nrpc_url = ").unwrap();
        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError {
                field: "chain.rpc_url",
                message: "bad".to_string(),
            },
            ValidationError {
                field: "chain.vote_gas_limit",
                message: "must be > 0".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: chain.rpc_url: bad, chain.vote_gas_limit: must be > 0"
        );
    }
}
