//! # Pool State - Serialized Pool Mutation over the AMM Engine
//!
//! ## Purpose
//!
//! Owns everything the stateless engine does not: pool records, LP
//! positions, reward accrual timestamps and protocol fee balances. Each
//! user action reads the pool, prices it through [`amm`], and writes the
//! result back under that pool's exclusive lock.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Swap forms, liquidity forms, reward claims, price feeds for TVL
//! - **Engine**: [`amm::SwapMath`], [`amm::LiquidityMath`], [`amm::PriceMath`], [`amm::RewardMath`]
//! - **Configuration**: [`amm_config::AmmConfig`] engine limits and pool defaults
//! - **Storage**: Any [`PoolRepository`]; [`InMemoryPoolRepository`] ships here
//!
//! ## Architecture Role
//!
//! ```text
//! User Action → [PoolManager] → [PoolRepository::update] → [AMM Engine]
//!      ↓              ↓                  ↓                      ↓
//! Swap Request   Validation        Per-pool Mutex          Pure Quotes
//! Add/Remove     Slippage Check    Draft + Commit          Rounded Results
//! Claim          Reward Accrual    Parallel Across Pools   No Shared State
//! ```
//!
//! Time is always supplied by the caller (`now_ms`), which keeps accrual
//! deterministic and testable.

pub mod error;
pub mod manager;
pub mod pool;
pub mod repository;
pub mod traits;

pub use error::{PoolStateError, PoolStateResult};
pub use manager::{
    LiquidityReceipt, ManagerStats, PoolManager, PoolStats, RemovalReceipt, SwapDetails,
    SwapReceipt, SwapRequest,
};
pub use pool::{PoolEntry, PoolId, PoolRecord, PoolSpec, Position};
pub use repository::InMemoryPoolRepository;

// Re-export core traits for convenience
pub use traits::PoolRepository;
