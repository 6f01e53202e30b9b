//! Constant-product swap pricing with fee-on-input
//!
//! `k = reserve_in * reserve_out` is held across the trade after the fee
//! is deducted from the input, so fees accrue to the pool and `k` grows.

use crate::error::{AmmError, AmmResult};
use crate::precision::{
    add, div, ensure_fee, ensure_positive, mul, round_amount, round_percent, sub,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fee assumed by [`SwapMath::validate`] (0.3%)
pub const DEFAULT_SWAP_FEE: Decimal = dec!(0.003);

/// Price impact ceiling used when none is given (50%)
pub const DEFAULT_MAX_PRICE_IMPACT: Decimal = dec!(0.5);

/// Result of an exact-input swap calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    /// Tokens leaving the pool, rounded to 8 decimals
    pub amount_out: Decimal,
    /// Relative spot price move caused by the trade, rounded to 6 decimals
    pub price_impact: Decimal,
    /// `amount_out / amount_in`, rounded to 8 decimals
    pub effective_price: Decimal,
}

/// Outcome of a pre-flight swap check
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Constant product swap math
pub struct SwapMath;

impl SwapMath {
    /// Calculate the output of selling `amount_in` into the pool
    ///
    /// # Arguments
    /// * `amount_in` - Input token amount
    /// * `reserve_in` - Reserve of the token being sold to the pool
    /// * `reserve_out` - Reserve of the token being bought
    /// * `swap_fee` - LP fee fraction in `[0, 1)` (0.003 = 0.3%)
    pub fn quote_output(
        amount_in: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
        swap_fee: Decimal,
    ) -> AmmResult<SwapQuote> {
        ensure_positive(amount_in, "input amount must be positive")?;
        ensure_positive(reserve_in, "reserves must be positive")?;
        ensure_positive(reserve_out, "reserves must be positive")?;
        ensure_fee(swap_fee)?;

        let amount_in_with_fee = mul(amount_in, Decimal::ONE - swap_fee)?;
        let k = mul(reserve_in, reserve_out)?;
        let new_reserve_in = add(reserve_in, amount_in_with_fee)?;
        let new_reserve_out = div(k, new_reserve_in)?;
        let amount_out = sub(reserve_out, new_reserve_out)?;

        // Checked after rounding: a dust output rounds to zero and a huge
        // input can round up to the whole reserve
        let rounded_out = round_amount(amount_out);
        if rounded_out <= Decimal::ZERO {
            return Err(AmmError::insufficient("swap output rounds to zero"));
        }
        if rounded_out >= reserve_out {
            return Err(AmmError::insufficient("swap output would drain reserves"));
        }

        let price_before = div(reserve_out, reserve_in)?;
        let price_after = div(new_reserve_out, new_reserve_in)?;
        let price_impact = div((price_after - price_before).abs(), price_before)?;
        let effective_price = div(amount_out, amount_in)?;

        let quote = SwapQuote {
            amount_out: rounded_out,
            price_impact: round_percent(price_impact),
            effective_price: round_amount(effective_price),
        };
        debug!(
            %amount_in, %reserve_in, %reserve_out, %swap_fee,
            amount_out = %quote.amount_out,
            price_impact = %quote.price_impact,
            "quoted swap output"
        );
        Ok(quote)
    }

    /// Calculate the input required to receive exactly `amount_out`
    ///
    /// The required input grows without bound as `amount_out` approaches
    /// `reserve_out`; a result beyond the decimal range is an `Overflow`.
    pub fn quote_input(
        amount_out: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
        swap_fee: Decimal,
    ) -> AmmResult<Decimal> {
        ensure_positive(amount_out, "output amount must be positive")?;
        ensure_positive(reserve_in, "reserves must be positive")?;
        ensure_positive(reserve_out, "reserves must be positive")?;
        ensure_fee(swap_fee)?;

        if amount_out >= reserve_out {
            return Err(AmmError::insufficient("output exceeds reserves"));
        }

        let k = mul(reserve_in, reserve_out)?;
        let new_reserve_out = sub(reserve_out, amount_out)?;
        let new_reserve_in = div(k, new_reserve_out)?;
        let amount_in = div(sub(new_reserve_in, reserve_in)?, Decimal::ONE - swap_fee)?;

        let amount_in = round_amount(amount_in);
        debug!(%amount_out, %reserve_in, %reserve_out, %swap_fee, %amount_in, "quoted swap input");
        Ok(amount_in)
    }

    /// Collect every violated swap precondition without failing fast
    ///
    /// Uses [`DEFAULT_SWAP_FEE`] for the impact estimate and
    /// [`DEFAULT_MAX_PRICE_IMPACT`] when no ceiling is given.
    pub fn validate(
        amount_in: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
        max_price_impact: Option<Decimal>,
    ) -> ValidationResult {
        let mut validator = SwapValidator::default();
        if let Some(ceiling) = max_price_impact {
            validator = validator.with_max_price_impact(ceiling);
        }
        validator.validate(amount_in, reserve_in, reserve_out)
    }
}

/// Configurable pre-flight check for swap forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapValidator {
    swap_fee: Decimal,
    max_price_impact: Decimal,
}

impl Default for SwapValidator {
    fn default() -> Self {
        Self {
            swap_fee: DEFAULT_SWAP_FEE,
            max_price_impact: DEFAULT_MAX_PRICE_IMPACT,
        }
    }
}

impl SwapValidator {
    pub fn new(swap_fee: Decimal, max_price_impact: Decimal) -> Self {
        Self {
            swap_fee,
            max_price_impact,
        }
    }

    pub fn with_max_price_impact(mut self, max_price_impact: Decimal) -> Self {
        self.max_price_impact = max_price_impact;
        self
    }

    pub fn max_price_impact(&self) -> Decimal {
        self.max_price_impact
    }

    pub fn validate(
        &self,
        amount_in: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
    ) -> ValidationResult {
        let mut errors = Vec::new();

        if amount_in <= Decimal::ZERO {
            errors.push("Swap amount must be greater than zero".to_string());
        }
        if reserve_in <= Decimal::ZERO || reserve_out <= Decimal::ZERO {
            errors.push("Pool reserves must be greater than zero".to_string());
        }
        if amount_in >= reserve_in {
            errors.push("Swap amount exceeds available pool liquidity".to_string());
        }

        match SwapMath::quote_output(amount_in, reserve_in, reserve_out, self.swap_fee) {
            Ok(quote) if quote.price_impact > self.max_price_impact => {
                errors.push(format!(
                    "Price impact {:.2}% exceeds maximum of {:.2}%",
                    quote.price_impact * dec!(100),
                    self.max_price_impact * dec!(100)
                ));
            }
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "swap validation could not price the trade");
                errors.push("Unable to calculate swap output".to_string());
            }
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
        }
    }
}
