use anyhow::Result;
use bridge_relayer::{BridgeConfig, RelayerSettings, TokenRegistry};
use std::path::PathBuf;
use std::time::Duration;

fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("configs")
        .join(name)
}

#[test]
fn test_testnet_config_merges_common_settings() -> Result<()> {
    let config = BridgeConfig::load(config_path("testnet.toml"))?;

    assert_eq!(config.network.name, "testnet");
    assert_eq!(config.origin.chain_id, 11155111);
    assert_eq!(config.destination.chain_id, 5001);

    // From common.toml
    assert_eq!(config.gas.min_gas_limit, 200_000);
    assert_eq!(config.gas.min_gas_limit_to, 250_000);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.monitoring.transaction_timeout(), Duration::from_secs(600));
    assert!(config.database.url.starts_with("sqlite:"));

    println!("✅ Testnet config loaded");
    Ok(())
}

#[test]
fn test_config_builds_token_registry_and_settings() -> Result<()> {
    for name in ["testnet.toml", "mainnet.toml"] {
        let config = BridgeConfig::load(config_path(name))?;

        let tokens = TokenRegistry::from_settings(&config.tokens)?;
        assert!(tokens.is_deposit_token(tokens.native_token()));
        assert!(tokens.is_deposit_token(tokens.governance_token()));

        let settings = RelayerSettings::from_config(&config)?;
        assert_eq!(settings.gas, config.gas);
        assert_eq!(settings.retry.max_attempts, config.retry.max_attempts);
    }
    Ok(())
}

#[test]
fn test_missing_config_file_is_an_error() {
    let result = BridgeConfig::load(config_path("does-not-exist.toml"));
    assert!(result.is_err());
}
