//! Time-weighted reward accrual
//!
//! Stateless: the caller tracks the last accrual time and passes the
//! elapsed minutes on each call.

use crate::precision::round_amount;
use rust_decimal::Decimal;
use tracing::trace;

pub struct RewardMath;

impl RewardMath {
    /// Rewards earned by an LP position over `elapsed_minutes`
    ///
    /// Returns zero for an empty position, an empty pool, or a
    /// non-positive interval.
    pub fn accrue_rewards(
        lp_balance: Decimal,
        total_lp_supply: Decimal,
        reward_rate_per_minute: Decimal,
        elapsed_minutes: Decimal,
    ) -> Decimal {
        if total_lp_supply <= Decimal::ZERO || lp_balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        if elapsed_minutes <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let share = lp_balance
            .checked_div(total_lp_supply)
            .unwrap_or(Decimal::ZERO);
        let total_reward = reward_rate_per_minute.saturating_mul(elapsed_minutes);
        let reward = round_amount(total_reward.saturating_mul(share));
        trace!(%lp_balance, %total_lp_supply, %elapsed_minutes, %reward, "accrued rewards");
        reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accrue_rewards_pro_rata() {
        let reward = RewardMath::accrue_rewards(dec!(1250), dec!(500000), dec!(10), dec!(60));
        assert_eq!(reward, dec!(1.5));
    }

    #[test]
    fn test_accrue_rewards_whole_pool() {
        let reward = RewardMath::accrue_rewards(dec!(100), dec!(100), dec!(2.5), dec!(4));
        assert_eq!(reward, dec!(10));
    }

    #[test]
    fn test_accrue_rewards_degenerate_positions() {
        assert_eq!(
            RewardMath::accrue_rewards(Decimal::ZERO, dec!(100), dec!(10), dec!(60)),
            Decimal::ZERO
        );
        assert_eq!(
            RewardMath::accrue_rewards(dec!(10), Decimal::ZERO, dec!(10), dec!(60)),
            Decimal::ZERO
        );
        assert_eq!(
            RewardMath::accrue_rewards(dec!(10), dec!(100), dec!(10), dec!(-5)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_accrue_rewards_is_idempotent() {
        let first = RewardMath::accrue_rewards(dec!(3), dec!(7), dec!(1), dec!(11));
        let second = RewardMath::accrue_rewards(dec!(3), dec!(7), dec!(1), dec!(11));
        assert_eq!(first, second);
        assert_eq!(first, dec!(4.71428571));
    }
}
