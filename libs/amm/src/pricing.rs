//! Spot price, k-invariant, TVL and APR utilities

use crate::error::AmmResult;
use crate::precision::{
    div, ensure_positive, mul, round_amount, round_display, DAYS_PER_YEAR, MINUTES_PER_DAY,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Relative `k` drift accepted by default when checking the invariant
pub const DEFAULT_INVARIANT_TOLERANCE: Decimal = dec!(0.0001);

/// Marginal prices of each token in terms of the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPrice {
    pub price_a_in_b: Decimal,
    pub price_b_in_a: Decimal,
}

pub struct PriceMath;

impl PriceMath {
    pub fn spot_price(reserve_a: Decimal, reserve_b: Decimal) -> AmmResult<SpotPrice> {
        ensure_positive(reserve_a, "reserves must be positive")?;
        ensure_positive(reserve_b, "reserves must be positive")?;

        Ok(SpotPrice {
            price_a_in_b: round_amount(div(reserve_b, reserve_a)?),
            price_b_in_a: round_amount(div(reserve_a, reserve_b)?),
        })
    }

    /// The constant product `k = reserve_a * reserve_b`
    pub fn pool_invariant(reserve_a: Decimal, reserve_b: Decimal) -> AmmResult<Decimal> {
        mul(reserve_a, reserve_b)
    }

    /// True when `k` moved by at most `tolerance` relative to its old value
    ///
    /// Fee growth counts as drift, so callers checking a swap either pass a
    /// fee-aware tolerance or compare against a fee-adjusted `k`.
    pub fn invariant_holds(
        old_a: Decimal,
        old_b: Decimal,
        new_a: Decimal,
        new_b: Decimal,
        tolerance: Decimal,
    ) -> bool {
        let (old_k, new_k) = match (old_a.checked_mul(old_b), new_a.checked_mul(new_b)) {
            (Some(old_k), Some(new_k)) => (old_k, new_k),
            _ => {
                warn!(%old_a, %old_b, %new_a, %new_b, "invariant check overflowed");
                return false;
            }
        };
        if old_k <= Decimal::ZERO {
            return new_k == old_k;
        }

        match ((new_k - old_k).abs()).checked_div(old_k) {
            Some(drift) => drift <= tolerance,
            None => false,
        }
    }

    /// Pool value in the reference unit; prices are taken as given
    pub fn total_value_locked(
        reserve_a: Decimal,
        reserve_b: Decimal,
        price_a: Decimal,
        price_b: Decimal,
    ) -> Decimal {
        let value = reserve_a
            .saturating_mul(price_a)
            .saturating_add(reserve_b.saturating_mul(price_b));
        round_display(value)
    }

    /// Annualized reward yield in percent; zero for an empty or worthless pool
    pub fn annual_percentage_rate(
        reward_rate_per_minute: Decimal,
        reward_token_price: Decimal,
        total_liquidity_value: Decimal,
    ) -> Decimal {
        if total_liquidity_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let rewards_per_year = reward_rate_per_minute
            .saturating_mul(Decimal::from(MINUTES_PER_DAY))
            .saturating_mul(Decimal::from(DAYS_PER_YEAR));
        let reward_value = rewards_per_year.saturating_mul(reward_token_price);
        // Saturate toward the sign of the reward value on overflow
        let saturated = if reward_value.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        };
        let apr = reward_value
            .checked_div(total_liquidity_value)
            .unwrap_or(saturated)
            .saturating_mul(dec!(100));
        round_display(apr)
    }
}
