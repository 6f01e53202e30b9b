//! Pool trait definitions for directional quoting

use crate::error::AmmResult;
use crate::pricing::{PriceMath, SpotPrice};
use crate::swap::{SwapMath, SwapQuote};
use crate::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the pair is sold into the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapDirection {
    AToB,
    BToA,
}

impl SwapDirection {
    pub fn from_token_in_is_a(token_in_is_a: bool) -> Self {
        if token_in_is_a {
            Self::AToB
        } else {
            Self::BToA
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::AToB => Self::BToA,
            Self::BToA => Self::AToB,
        }
    }
}

/// Pair reserves, stored by token rather than by swap direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub reserve_a: Decimal,
    pub reserve_b: Decimal,
}

impl PoolReserves {
    pub fn new(reserve_a: Decimal, reserve_b: Decimal) -> Self {
        Self {
            reserve_a,
            reserve_b,
        }
    }

    /// `(reserve_in, reserve_out)` for a swap in `direction`
    pub fn directional(&self, direction: SwapDirection) -> (Decimal, Decimal) {
        match direction {
            SwapDirection::AToB => (self.reserve_a, self.reserve_b),
            SwapDirection::BToA => (self.reserve_b, self.reserve_a),
        }
    }
}

/// Unified constant-product interface for anything holding pool state
pub trait AmmPool {
    /// Current reserves
    fn reserves(&self) -> PoolReserves;

    /// LP fee fraction charged on input
    fn swap_fee(&self) -> Decimal;

    /// Calculate output amount for given input
    fn quote_output(&self, direction: SwapDirection, amount_in: Decimal) -> AmmResult<SwapQuote> {
        let (reserve_in, reserve_out) = self.reserves().directional(direction);
        SwapMath::quote_output(amount_in, reserve_in, reserve_out, self.swap_fee())
    }

    /// Calculate required input for desired output
    fn quote_input(&self, direction: SwapDirection, amount_out: Decimal) -> AmmResult<Decimal> {
        let (reserve_in, reserve_out) = self.reserves().directional(direction);
        SwapMath::quote_input(amount_out, reserve_in, reserve_out, self.swap_fee())
    }

    fn spot_price(&self) -> AmmResult<SpotPrice> {
        let reserves = self.reserves();
        PriceMath::spot_price(reserves.reserve_a, reserves.reserve_b)
    }

    fn invariant(&self) -> AmmResult<Decimal> {
        let reserves = self.reserves();
        PriceMath::pool_invariant(reserves.reserve_a, reserves.reserve_b)
    }
}

/// Bare reserves plus a fee, for quoting without a full pool record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantProductPool {
    pub reserves: PoolReserves,
    pub swap_fee: Decimal,
}

impl AmmPool for ConstantProductPool {
    fn reserves(&self) -> PoolReserves {
        self.reserves
    }

    fn swap_fee(&self) -> Decimal {
        self.swap_fee
    }
}
