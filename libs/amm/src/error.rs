//! Error types for pool math
//!
//! Every failure is deterministic given its inputs, so callers reject the
//! user action rather than retry.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the fail-fast engine operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmmError {
    /// A numeric precondition (positivity, range) does not hold
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: &'static str },

    /// Reserves cannot support the requested swap or output
    #[error("Insufficient liquidity: {reason}")]
    InsufficientLiquidity { reason: &'static str },

    /// LP burn larger than everything ever minted
    #[error("LP amount {requested} exceeds total supply {total_supply}")]
    ExceedsSupply {
        requested: Decimal,
        total_supply: Decimal,
    },

    /// Intermediate value left the representable decimal range
    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },
}

impl AmmError {
    pub(crate) fn invalid(reason: &'static str) -> Self {
        Self::InvalidInput { reason }
    }

    pub(crate) fn insufficient(reason: &'static str) -> Self {
        Self::InsufficientLiquidity { reason }
    }
}

pub type AmmResult<T> = Result<T, AmmError>;
