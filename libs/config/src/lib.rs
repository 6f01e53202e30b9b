//! # Pool Engine Configuration
//!
//! Centralized configuration for the pool math engine and the pool state
//! layer built on it.
//!
//! ## Features
//!
//! - **Engine Limits**: Price impact ceiling, invariant tolerance, slippage default
//! - **Pool Defaults**: Swap fee, protocol fee and reward rate for new pools
//! - **Logging**: `tracing-subscriber` setup with env-filter and optional JSON
//!
//! ## Usage
//!
//! ```rust,no_run
//! use amm_config::{init_logging, load_config};
//!
//! let config = load_config(Some("production"))?;
//! init_logging(&config.logging)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod amm_config;
pub mod logging;

// Re-export commonly used types
pub use amm_config::{
    load_config, AmmConfig, EngineConfig, LoggingConfig, PoolDefaults, DEFAULT_CONFIG_PATH,
};
pub use logging::init_logging;
