//! Rounding policy and checked decimal arithmetic
//!
//! Intermediate math runs at full `Decimal` precision (28 significant
//! digits). Rounding happens once, as the last step of each public
//! operation, half away from zero.

use crate::error::{AmmError, AmmResult};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Decimal places for token amounts, LP tokens, rewards and prices
pub const PRECISION: u32 = 8;

/// Decimal places for fractional shares and price impact
pub const PERCENT_PRECISION: u32 = 6;

/// Decimal places for TVL and APR
pub const DISPLAY_PRECISION: u32 = 2;

pub const MINUTES_PER_DAY: u32 = 1440;
pub const DAYS_PER_YEAR: u32 = 365;

/// Round half away from zero to `dp` decimal places
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_amount(value: Decimal) -> Decimal {
    round_to(value, PRECISION)
}

pub fn round_percent(value: Decimal) -> Decimal {
    round_to(value, PERCENT_PRECISION)
}

pub fn round_display(value: Decimal) -> Decimal {
    round_to(value, DISPLAY_PRECISION)
}

pub(crate) fn mul(a: Decimal, b: Decimal) -> AmmResult<Decimal> {
    a.checked_mul(b)
        .ok_or(AmmError::Overflow { operation: "multiplication" })
}

pub(crate) fn div(a: Decimal, b: Decimal) -> AmmResult<Decimal> {
    if b.is_zero() {
        return Err(AmmError::invalid("division by zero"));
    }
    a.checked_div(b)
        .ok_or(AmmError::Overflow { operation: "division" })
}

pub(crate) fn add(a: Decimal, b: Decimal) -> AmmResult<Decimal> {
    a.checked_add(b)
        .ok_or(AmmError::Overflow { operation: "addition" })
}

pub(crate) fn sub(a: Decimal, b: Decimal) -> AmmResult<Decimal> {
    a.checked_sub(b)
        .ok_or(AmmError::Overflow { operation: "subtraction" })
}

/// Fee fractions live in `[0, 1)`; 0.3% is passed as `0.003`
pub(crate) fn ensure_fee(fee: Decimal) -> AmmResult<()> {
    if fee < Decimal::ZERO || fee >= Decimal::ONE {
        return Err(AmmError::invalid("fee must be a fraction in [0, 1)"));
    }
    Ok(())
}

pub(crate) fn ensure_positive(value: Decimal, reason: &'static str) -> AmmResult<()> {
    if value <= Decimal::ZERO {
        return Err(AmmError::invalid(reason));
    }
    Ok(())
}

/// Square root of a Decimal using Newton's method
///
/// Converges to the full 28-digit precision of `Decimal`; callers round
/// the result themselves.
pub fn decimal_sqrt(value: Decimal) -> AmmResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(AmmError::invalid("cannot take square root of a negative number"));
    }
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }

    // Start above the root so the iteration decreases monotonically
    let mut x = if value > Decimal::ONE { value } else { Decimal::ONE };
    let epsilon = dec!(0.000000000000000001);

    for _ in 0..200 {
        let next_x = add(x, div(value, x)?)? / dec!(2);
        if (x - next_x).abs() <= epsilon {
            return Ok(next_x);
        }
        x = next_x;
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(dec!(1.005), 2), dec!(1.01));
        assert_eq!(round_to(dec!(-1.005), 2), dec!(-1.01));
        assert_eq!(round_to(dec!(2.5), 0), dec!(3));
        assert_eq!(round_amount(dec!(0.123456785)), dec!(0.12345679));
        assert_eq!(round_percent(dec!(0.0019910219)), dec!(0.001991));
    }

    #[test]
    fn test_sqrt_accuracy() {
        assert_eq!(round_amount(decimal_sqrt(dec!(100)).unwrap()), dec!(10));
        assert_eq!(
            round_amount(decimal_sqrt(dec!(250000000000)).unwrap()),
            dec!(500000)
        );
        let root_two = decimal_sqrt(dec!(2)).unwrap();
        assert!((root_two - dec!(1.41421356237)).abs() < dec!(0.00000000001));
        let small = decimal_sqrt(dec!(0.0001)).unwrap();
        assert!((small - dec!(0.01)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_sqrt_rejects_negative() {
        assert!(decimal_sqrt(dec!(-4)).is_err());
        assert_eq!(decimal_sqrt(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_fee_bounds() {
        assert!(ensure_fee(Decimal::ZERO).is_ok());
        assert!(ensure_fee(dec!(0.003)).is_ok());
        assert!(ensure_fee(Decimal::ONE).is_err());
        assert!(ensure_fee(dec!(-0.001)).is_err());
    }

    #[test]
    fn test_checked_division_by_zero() {
        assert_eq!(
            div(Decimal::ONE, Decimal::ZERO),
            Err(AmmError::InvalidInput { reason: "division by zero" })
        );
    }
}
