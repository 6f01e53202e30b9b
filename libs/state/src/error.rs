//! Pool state specific errors

use crate::pool::PoolId;
use amm::AmmError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoolStateError {
    #[error("Pool not found: {0}")]
    PoolNotFound(PoolId),

    #[error("Pool already exists: {0}")]
    PoolExists(PoolId),

    #[error("No position for {owner} in pool {pool}")]
    PositionNotFound { pool: PoolId, owner: String },

    #[error("Invalid pool parameters: {0}")]
    InvalidParameters(String),

    #[error("LP balance {available} is less than requested {requested}")]
    InsufficientLpBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Swap output {actual} is below minimum {minimum}")]
    SlippageExceeded { minimum: Decimal, actual: Decimal },

    #[error("Swap rejected: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Constant product shrank from {before} to {after}")]
    InvariantViolated { before: Decimal, after: Decimal },

    #[error("Required input {required} exceeds ceiling {ceiling}")]
    InputCeilingExceeded { required: Decimal, ceiling: Decimal },

    #[error(transparent)]
    Math(#[from] AmmError),
}

pub type PoolStateResult<T> = Result<T, PoolStateError>;
