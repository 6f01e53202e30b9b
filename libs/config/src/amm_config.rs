//! Engine Configuration Module
//!
//! Loads pool engine settings from TOML files with environment-specific
//! overrides and `AMM_`-prefixed environment variables.

use anyhow::{ensure, Context, Result};
use config_crate::{Config, Environment, File, Map};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default location of the base configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/amm.toml";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AmmConfig {
    /// Swap and invariant checks
    pub engine: EngineConfig,

    /// Parameters applied to newly created pools
    pub pool_defaults: PoolDefaults,

    pub logging: LoggingConfig,
}

/// Limits applied around engine calls
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest price impact a swap may cause, as a fraction
    pub max_price_impact: Decimal,
    /// Relative `k` drift accepted by invariant checks
    pub invariant_tolerance: Decimal,
    /// Slippage used for `minimum_received` when a request names none
    pub default_slippage_tolerance: Decimal,
    /// Reject exact-output swaps needing more than this multiple of the
    /// input reserve; unset means no ceiling
    pub max_input_to_reserve_ratio: Option<Decimal>,
}

/// Fee and reward parameters for new pools
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PoolDefaults {
    pub swap_fee: Decimal,
    pub protocol_fee: Decimal,
    pub reward_rate_per_minute: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_price_impact: dec!(0.5),
            invariant_tolerance: dec!(0.0001),
            default_slippage_tolerance: dec!(0.005),
            max_input_to_reserve_ratio: None,
        }
    }
}

impl Default for PoolDefaults {
    fn default() -> Self {
        Self {
            swap_fee: dec!(0.003),
            protocol_fee: dec!(0.0005),
            reward_rate_per_minute: Decimal::ZERO,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AmmConfig {
    /// Load configuration from files with environment overrides
    ///
    /// An explicit `base_path` must exist; the default path is optional so
    /// a bare checkout runs on built-in defaults.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_env(base_path, environment, None)
    }

    /// Same as [`AmmConfig::load`], reading variables from `env_source`
    /// instead of the process environment when given
    pub fn load_with_env(
        base_path: Option<&Path>,
        environment: Option<&str>,
        env_source: Option<Map<String, String>>,
    ) -> Result<Self> {
        let (base, required) = match base_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        debug!("Loading base config: {:?}", base);

        let mut builder = Config::builder().add_source(File::from(base.as_path()).required(required));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (AMM_ENGINE__MAX_PRICE_IMPACT=0.3)
        builder = builder.add_source(
            Environment::with_prefix("AMM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env_source),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject values the engine would refuse at call time
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        ensure!(
            engine.max_price_impact > Decimal::ZERO && engine.max_price_impact <= Decimal::ONE,
            "engine.max_price_impact must be in (0, 1], got {}",
            engine.max_price_impact
        );
        ensure!(
            engine.invariant_tolerance > Decimal::ZERO,
            "engine.invariant_tolerance must be positive, got {}",
            engine.invariant_tolerance
        );
        ensure!(
            engine.default_slippage_tolerance >= Decimal::ZERO
                && engine.default_slippage_tolerance < Decimal::ONE,
            "engine.default_slippage_tolerance must be in [0, 1), got {}",
            engine.default_slippage_tolerance
        );
        if let Some(ratio) = engine.max_input_to_reserve_ratio {
            ensure!(
                ratio > Decimal::ZERO,
                "engine.max_input_to_reserve_ratio must be positive, got {}",
                ratio
            );
        }

        let pools = &self.pool_defaults;
        for (name, fee) in [
            ("pool_defaults.swap_fee", pools.swap_fee),
            ("pool_defaults.protocol_fee", pools.protocol_fee),
        ] {
            ensure!(
                fee >= Decimal::ZERO && fee < Decimal::ONE,
                "{} must be a fraction in [0, 1), got {}",
                name,
                fee
            );
        }
        ensure!(
            pools.reward_rate_per_minute >= Decimal::ZERO,
            "pool_defaults.reward_rate_per_minute cannot be negative"
        );
        Ok(())
    }

    /// Render as TOML, e.g. to seed a config file
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Convenience function to load and validate configuration with defaults
pub fn load_config(environment: Option<&str>) -> Result<AmmConfig> {
    let config = AmmConfig::load(None, environment)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("amm.toml");

        let config_content = r#"
[engine]
max_price_impact = 0.25
invariant_tolerance = 0.001

[pool_defaults]
swap_fee = 0.01
reward_rate_per_minute = 10

[logging]
level = "debug"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = AmmConfig::load_with_env(Some(&config_path), None, Some(Map::new())).unwrap();

        assert_eq!(config.engine.max_price_impact, dec!(0.25));
        assert_eq!(config.engine.invariant_tolerance, dec!(0.001));
        assert_eq!(config.engine.default_slippage_tolerance, dec!(0.005));
        assert_eq!(config.pool_defaults.swap_fee, dec!(0.01));
        assert_eq!(config.pool_defaults.protocol_fee, dec!(0.0005));
        assert_eq!(config.pool_defaults.reward_rate_per_minute, dec!(10));
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AmmConfig::load_with_env(Some(&missing), None, Some(Map::new())).is_err());
    }

    #[test]
    fn test_environment_file_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("amm.toml");
        fs::write(&config_path, "[engine]\nmax_price_impact = 0.5\n").unwrap();
        fs::create_dir(dir.path().join("environments")).unwrap();
        fs::write(
            dir.path().join("environments").join("strict.toml"),
            "[engine]\nmax_price_impact = 0.05\n",
        )
        .unwrap();

        let config =
            AmmConfig::load_with_env(Some(&config_path), Some("strict"), Some(Map::new())).unwrap();
        assert_eq!(config.engine.max_price_impact, dec!(0.05));

        // Unknown environments fall back to the base file
        let config =
            AmmConfig::load_with_env(Some(&config_path), Some("absent"), Some(Map::new())).unwrap();
        assert_eq!(config.engine.max_price_impact, dec!(0.5));
    }

    #[test]
    fn test_environment_variable_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("amm.toml");
        fs::write(&config_path, "[pool_defaults]\nswap_fee = 0.003\n").unwrap();

        let mut env = Map::new();
        env.insert("AMM_POOL_DEFAULTS__SWAP_FEE".to_string(), "0.001".to_string());
        env.insert("AMM_LOGGING__JSON".to_string(), "true".to_string());

        let config = AmmConfig::load_with_env(Some(&config_path), None, Some(env)).unwrap();
        assert_eq!(config.pool_defaults.swap_fee, dec!(0.001));
        assert!(config.logging.json);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AmmConfig::default();
        assert!(config.validate().is_ok());

        config.pool_defaults.swap_fee = Decimal::ONE;
        assert!(config.validate().is_err());

        let mut config = AmmConfig::default();
        config.engine.max_price_impact = Decimal::ZERO;
        assert!(config.validate().is_err());

        let mut config = AmmConfig::default();
        config.engine.max_input_to_reserve_ratio = Some(dec!(-1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("amm.toml");
        let mut original = AmmConfig::default();
        original.engine.max_input_to_reserve_ratio = Some(dec!(100));
        fs::write(&config_path, original.to_toml().unwrap()).unwrap();

        let loaded = AmmConfig::load_with_env(Some(&config_path), None, Some(Map::new())).unwrap();
        assert_eq!(loaded, original);
    }
}
