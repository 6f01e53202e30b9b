//! Liquidity provisioning and removal
//!
//! LP tokens are a proportional claim on both reserves. The first deposit
//! fixes the unit scale at the geometric mean of the deposited amounts;
//! every later mint and burn is pro rata against that supply.

use crate::error::{AmmError, AmmResult};
use crate::precision::{
    add, decimal_sqrt, div, ensure_positive, mul, round_amount, round_percent,
};
use crate::pricing::PriceMath;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Preview of a deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityQuote {
    pub lp_tokens_minted: Decimal,
    /// Depositor's share of the pool after the mint, in percent
    pub share_after_percent: Decimal,
    pub token_a_required: Decimal,
    pub token_b_required: Decimal,
    pub spot_price_a_in_b: Decimal,
    pub spot_price_b_in_a: Decimal,
}

/// Token pair amounts that match the current reserve ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalAmounts {
    pub amount_a: Decimal,
    pub amount_b: Decimal,
}

/// Preview of an LP burn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalQuote {
    pub amount_a: Decimal,
    pub amount_b: Decimal,
    /// Fraction of total supply burned, rounded to 6 decimals
    pub share_removed: Decimal,
}

pub struct LiquidityMath;

impl LiquidityMath {
    /// Bootstrap mint for an empty pool: `sqrt(amount_a * amount_b)`
    pub fn initial_lp_tokens(amount_a: Decimal, amount_b: Decimal) -> AmmResult<Decimal> {
        ensure_positive(amount_a, "deposit amounts must be positive")?;
        ensure_positive(amount_b, "deposit amounts must be positive")?;

        let minted = decimal_sqrt(mul(amount_a, amount_b)?)?;
        Ok(round_amount(minted))
    }

    /// Mint for a deposit into a funded pool
    ///
    /// Credits only the limiting side, so an off-ratio deposit cannot mint
    /// more than its proportional claim.
    pub fn subsequent_lp_tokens(
        amount_a: Decimal,
        amount_b: Decimal,
        reserve_a: Decimal,
        reserve_b: Decimal,
        total_lp_supply: Decimal,
    ) -> AmmResult<Decimal> {
        ensure_positive(reserve_a, "reserves must be positive")?;
        ensure_positive(reserve_b, "reserves must be positive")?;
        ensure_positive(total_lp_supply, "total LP supply must be positive")?;
        if amount_a < Decimal::ZERO || amount_b < Decimal::ZERO {
            return Err(AmmError::invalid("deposit amounts cannot be negative"));
        }

        let ratio_a = div(amount_a, reserve_a)?;
        let ratio_b = div(amount_b, reserve_b)?;
        let minted = mul(ratio_a.min(ratio_b), total_lp_supply)?;
        Ok(round_amount(minted))
    }

    /// Derive the counterpart deposit that keeps the reserve ratio
    pub fn proportional_amount(
        input_amount: Decimal,
        input_is_token_a: bool,
        reserve_a: Decimal,
        reserve_b: Decimal,
    ) -> AmmResult<ProportionalAmounts> {
        ensure_positive(reserve_a, "reserves must be positive")?;
        ensure_positive(reserve_b, "reserves must be positive")?;

        let amounts = if input_is_token_a {
            ProportionalAmounts {
                amount_a: input_amount,
                amount_b: round_amount(div(mul(input_amount, reserve_b)?, reserve_a)?),
            }
        } else {
            ProportionalAmounts {
                amount_a: round_amount(div(mul(input_amount, reserve_a)?, reserve_b)?),
                amount_b: input_amount,
            }
        };
        Ok(amounts)
    }

    /// Full deposit preview: minted LP, resulting share and post-deposit prices
    ///
    /// A zero `total_lp_supply` is treated as the pool's first deposit.
    pub fn quote_add_liquidity(
        amount_a: Decimal,
        amount_b: Decimal,
        reserve_a: Decimal,
        reserve_b: Decimal,
        total_lp_supply: Decimal,
    ) -> AmmResult<LiquidityQuote> {
        if total_lp_supply < Decimal::ZERO {
            return Err(AmmError::invalid("total LP supply cannot be negative"));
        }

        let (minted, share_after_percent, new_a, new_b) = if total_lp_supply.is_zero() {
            let minted = Self::initial_lp_tokens(amount_a, amount_b)?;
            (minted, dec!(100), amount_a, amount_b)
        } else {
            let minted = Self::subsequent_lp_tokens(
                amount_a,
                amount_b,
                reserve_a,
                reserve_b,
                total_lp_supply,
            )?;
            let share = div(minted, add(total_lp_supply, minted)?)?;
            (
                minted,
                round_percent(mul(share, dec!(100))?),
                add(reserve_a, amount_a)?,
                add(reserve_b, amount_b)?,
            )
        };

        let prices = PriceMath::spot_price(new_a, new_b)?;
        let quote = LiquidityQuote {
            lp_tokens_minted: minted,
            share_after_percent,
            token_a_required: amount_a,
            token_b_required: amount_b,
            spot_price_a_in_b: prices.price_a_in_b,
            spot_price_b_in_a: prices.price_b_in_a,
        };
        debug!(%amount_a, %amount_b, lp_tokens = %minted, "quoted liquidity deposit");
        Ok(quote)
    }

    /// Pro rata withdrawal for burning `lp_amount`
    pub fn quote_remove_liquidity(
        lp_amount: Decimal,
        total_lp_supply: Decimal,
        reserve_a: Decimal,
        reserve_b: Decimal,
    ) -> AmmResult<RemovalQuote> {
        ensure_positive(lp_amount, "LP amount must be positive")?;
        ensure_positive(total_lp_supply, "total LP supply must be positive")?;
        ensure_positive(reserve_a, "reserves must be positive")?;
        ensure_positive(reserve_b, "reserves must be positive")?;
        if lp_amount > total_lp_supply {
            return Err(AmmError::ExceedsSupply {
                requested: lp_amount,
                total_supply: total_lp_supply,
            });
        }

        let share = div(lp_amount, total_lp_supply)?;
        let quote = RemovalQuote {
            amount_a: round_amount(mul(share, reserve_a)?),
            amount_b: round_amount(mul(share, reserve_b)?),
            share_removed: round_percent(share),
        };
        debug!(%lp_amount, %total_lp_supply, amount_a = %quote.amount_a, amount_b = %quote.amount_b, "quoted liquidity removal");
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_lp_tokens_geometric_mean() {
        let minted = LiquidityMath::initial_lp_tokens(dec!(1000000), dec!(250000)).unwrap();
        assert_eq!(minted, dec!(500000));

        let minted = LiquidityMath::initial_lp_tokens(dec!(2), dec!(1)).unwrap();
        assert_eq!(minted, dec!(1.41421356));
    }

    #[test]
    fn test_initial_lp_tokens_rejects_empty_side() {
        assert!(matches!(
            LiquidityMath::initial_lp_tokens(Decimal::ZERO, dec!(10)),
            Err(AmmError::InvalidInput { .. })
        ));
        assert!(LiquidityMath::initial_lp_tokens(dec!(10), dec!(-1)).is_err());
    }

    #[test]
    fn test_subsequent_lp_tokens_proportional() {
        let minted = LiquidityMath::subsequent_lp_tokens(
            dec!(10000),
            dec!(2500),
            dec!(1000000),
            dec!(250000),
            dec!(500000),
        )
        .unwrap();
        assert_eq!(minted, dec!(5000));
    }

    #[test]
    fn test_subsequent_lp_tokens_credits_limiting_side() {
        // Token B is over-supplied; only the 1% A side counts
        let minted = LiquidityMath::subsequent_lp_tokens(
            dec!(10000),
            dec!(5000),
            dec!(1000000),
            dec!(250000),
            dec!(500000),
        )
        .unwrap();
        assert_eq!(minted, dec!(5000));
    }

    #[test]
    fn test_subsequent_lp_tokens_requires_funded_pool() {
        for (ra, rb, supply) in [
            (Decimal::ZERO, dec!(1), dec!(1)),
            (dec!(1), Decimal::ZERO, dec!(1)),
            (dec!(1), dec!(1), Decimal::ZERO),
        ] {
            let err = LiquidityMath::subsequent_lp_tokens(dec!(1), dec!(1), ra, rb, supply)
                .unwrap_err();
            assert!(matches!(err, AmmError::InvalidInput { .. }));
        }
    }

    #[test]
    fn test_proportional_amount_both_directions() {
        let from_a =
            LiquidityMath::proportional_amount(dec!(100), true, dec!(1000000), dec!(250000))
                .unwrap();
        assert_eq!(from_a.amount_a, dec!(100));
        assert_eq!(from_a.amount_b, dec!(25));

        let from_b =
            LiquidityMath::proportional_amount(dec!(25), false, dec!(1000000), dec!(250000))
                .unwrap();
        assert_eq!(from_b.amount_a, dec!(100));
        assert_eq!(from_b.amount_b, dec!(25));

        assert!(LiquidityMath::proportional_amount(dec!(1), true, Decimal::ZERO, dec!(1)).is_err());
    }

    #[test]
    fn test_quote_add_liquidity_initial_deposit() {
        let quote = LiquidityMath::quote_add_liquidity(
            dec!(1000000),
            dec!(250000),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(quote.lp_tokens_minted, dec!(500000));
        assert_eq!(quote.share_after_percent, dec!(100));
        assert_eq!(quote.spot_price_a_in_b, dec!(0.25));
        assert_eq!(quote.spot_price_b_in_a, dec!(4));
    }

    #[test]
    fn test_quote_add_liquidity_subsequent_deposit() {
        let quote = LiquidityMath::quote_add_liquidity(
            dec!(1000000),
            dec!(250000),
            dec!(1000000),
            dec!(250000),
            dec!(500000),
        )
        .unwrap();
        assert_eq!(quote.lp_tokens_minted, dec!(500000));
        assert_eq!(quote.share_after_percent, dec!(50));
        assert_eq!(quote.token_a_required, dec!(1000000));
        assert_eq!(quote.token_b_required, dec!(250000));
        assert_eq!(quote.spot_price_a_in_b, dec!(0.25));
    }

    #[test]
    fn test_remove_everything_drains_pool() {
        let quote = LiquidityMath::quote_remove_liquidity(
            dec!(500000),
            dec!(500000),
            dec!(1000000),
            dec!(250000),
        )
        .unwrap();
        assert_eq!(quote.amount_a, dec!(1000000));
        assert_eq!(quote.amount_b, dec!(250000));
        assert_eq!(quote.share_removed, Decimal::ONE);
    }

    #[test]
    fn test_remove_partial_share() {
        let quote = LiquidityMath::quote_remove_liquidity(
            dec!(1),
            dec!(3),
            dec!(100),
            dec!(50),
        )
        .unwrap();
        assert_eq!(quote.amount_a, dec!(33.33333333));
        assert_eq!(quote.amount_b, dec!(16.66666667));
        assert_eq!(quote.share_removed, dec!(0.333333));
    }

    #[test]
    fn test_remove_exceeding_supply() {
        let err = LiquidityMath::quote_remove_liquidity(dec!(11), dec!(10), dec!(100), dec!(100))
            .unwrap_err();
        assert_eq!(
            err,
            AmmError::ExceedsSupply {
                requested: dec!(11),
                total_supply: dec!(10),
            }
        );
        assert!(matches!(
            LiquidityMath::quote_remove_liquidity(Decimal::ZERO, dec!(10), dec!(100), dec!(100)),
            Err(AmmError::InvalidInput { .. })
        ));
    }
}
