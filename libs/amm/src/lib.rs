//! # AMM Library - Constant Product Pool Math Engine
//!
//! ## Purpose
//!
//! Stateless calculation engine for constant-product (`x * y = k`) liquidity
//! pools: swap pricing in both directions, LP-token minting and burning,
//! spot prices, invariant checks, TVL/APR statistics and time-weighted
//! reward accrual. Every operation is a pure function of its arguments.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Pool records owned by the orchestration layer (`pool-state`)
//! - **Output Destinations**: Swap forms, liquidity dashboards, reward claims
//! - **Units**: Fees are fractions in `[0, 1)`; 0.3% is passed as `0.003`
//! - **Precision**: `Decimal` arithmetic, rounded half away from zero as the
//!   final step ([`precision::PRECISION`] = 8, [`precision::PERCENT_PRECISION`] = 6,
//!   [`precision::DISPLAY_PRECISION`] = 2)
//! - **Errors**: Fail-fast [`AmmError`] except for [`SwapMath::validate`],
//!   TVL, APR and reward accrual, which degrade gracefully
//!
//! ## Architecture Role
//!
//! The engine holds no state across calls. Callers own pool reserves,
//! serialize mutation per pool, and re-invoke the engine on every change.
//!
//! See [`architecture_diagram()`] for visual representation of the data flow.
//!
//! ## Concurrency
//!
//! No shared state, no I/O, no blocking. Every function is safe to call
//! from any number of threads at once.

pub mod error;
pub mod liquidity;
pub mod pool_traits;
pub mod precision;
pub mod pricing;
pub mod rewards;
pub mod swap;

pub use error::{AmmError, AmmResult};
pub use liquidity::{LiquidityMath, LiquidityQuote, ProportionalAmounts, RemovalQuote};
pub use pool_traits::{AmmPool, ConstantProductPool, PoolReserves, SwapDirection};
pub use pricing::{PriceMath, SpotPrice, DEFAULT_INVARIANT_TOLERANCE};
pub use rewards::RewardMath;
pub use swap::{
    SwapMath, SwapQuote, SwapValidator, ValidationResult, DEFAULT_MAX_PRICE_IMPACT,
    DEFAULT_SWAP_FEE,
};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Architecture diagram showing how callers drive the engine
#[cfg_attr(doc, aquamarine::aquamarine)]
/// ```mermaid
/// graph LR
///     subgraph Caller["📦 Orchestration Layer"]
///         PR[Pool Records]
///         PO[LP Positions]
///         LK[Per-pool Locks]
///     end
///
///     subgraph Engine["🧮 Pool Math Engine"]
///         SW[Swap Pricing]
///         LQ[Liquidity Provisioning]
///         RM[Liquidity Removal]
///         PX[Price & Invariant]
///         RW[Reward Accrual]
///         VA[Swap Validation]
///     end
///
///     subgraph Output["🎯 Results"]
///         SQ[SwapQuote]
///         LQO[LiquidityQuote]
///         RQ[RemovalQuote]
///         ST[TVL / APR]
///     end
///
///     PR --> SW
///     PR --> LQ
///     PR --> RM
///     PR --> PX
///     PO --> RW
///     LK --> PR
///     SW --> VA
///
///     SW --> SQ
///     LQ --> LQO
///     RM --> RQ
///     PX --> ST
///
///     style Caller fill:#e1f5fe
///     style Engine fill:#fff3e0
///     style Output fill:#e8f5e9
/// ```
pub fn architecture_diagram() {
    // This function exists solely for documentation purposes
    // The diagram is rendered by aquamarine in rustdoc
}
