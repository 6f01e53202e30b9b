//! Pool records and LP positions
//!
//! Reserves are stored per token; swap direction is resolved on each call.

use amm::{AmmPool, PoolReserves, RewardMath};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const MS_PER_MINUTE: Decimal = dec!(60000);

/// Pool identifier chosen by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub String);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoolId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PoolId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Parameters for a new pool; unset values come from configured defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub id: PoolId,
    pub token_a: String,
    pub token_b: String,
    pub swap_fee: Option<Decimal>,
    pub protocol_fee: Option<Decimal>,
    pub reward_rate_per_minute: Option<Decimal>,
}

impl PoolSpec {
    pub fn new(id: impl Into<PoolId>, token_a: impl Into<String>, token_b: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            token_a: token_a.into(),
            token_b: token_b.into(),
            swap_fee: None,
            protocol_fee: None,
            reward_rate_per_minute: None,
        }
    }

    pub fn with_swap_fee(mut self, fee: Decimal) -> Self {
        self.swap_fee = Some(fee);
        self
    }

    pub fn with_protocol_fee(mut self, fee: Decimal) -> Self {
        self.protocol_fee = Some(fee);
        self
    }

    pub fn with_reward_rate(mut self, rate_per_minute: Decimal) -> Self {
        self.reward_rate_per_minute = Some(rate_per_minute);
        self
    }
}

/// Complete state of a single pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub id: PoolId,
    pub token_a: String,
    pub token_b: String,

    pub reserve_a: Decimal,
    pub reserve_b: Decimal,
    pub total_lp_supply: Decimal,

    pub swap_fee: Decimal,
    pub protocol_fee: Decimal,
    /// Protocol skim collected so far, kept outside the reserves
    pub protocol_fees_a: Decimal,
    pub protocol_fees_b: Decimal,

    pub reward_rate_per_minute: Decimal,

    pub created_at_ms: u64,
    pub last_update_ms: u64,
}

impl PoolRecord {
    /// Has the first deposit happened (and not been fully withdrawn)
    pub fn is_funded(&self) -> bool {
        self.total_lp_supply > Decimal::ZERO
            && self.reserve_a > Decimal::ZERO
            && self.reserve_b > Decimal::ZERO
    }
}

impl AmmPool for PoolRecord {
    fn reserves(&self) -> PoolReserves {
        PoolReserves::new(self.reserve_a, self.reserve_b)
    }

    fn swap_fee(&self) -> Decimal {
        self.swap_fee
    }
}

/// An owner's LP holding in one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub owner: String,
    pub lp_balance: Decimal,
    /// Accrued but not yet claimed
    pub unclaimed_rewards: Decimal,
    pub last_accrual_ms: u64,
}

impl Position {
    pub fn new(owner: impl Into<String>, now_ms: u64) -> Self {
        Self {
            owner: owner.into(),
            lp_balance: Decimal::ZERO,
            unclaimed_rewards: Decimal::ZERO,
            last_accrual_ms: now_ms,
        }
    }

    /// Bring rewards up to `now_ms` at the given pool supply and rate
    ///
    /// A clock earlier than the last accrual earns nothing and does not
    /// move the accrual point backwards.
    pub fn accrue(&mut self, total_lp_supply: Decimal, reward_rate_per_minute: Decimal, now_ms: u64) {
        if now_ms <= self.last_accrual_ms {
            return;
        }
        let elapsed_minutes = Decimal::from(now_ms - self.last_accrual_ms) / MS_PER_MINUTE;
        let earned = RewardMath::accrue_rewards(
            self.lp_balance,
            total_lp_supply,
            reward_rate_per_minute,
            elapsed_minutes,
        );
        self.unclaimed_rewards = self.unclaimed_rewards.saturating_add(earned);
        self.last_accrual_ms = now_ms;
    }
}

/// A pool together with its positions; the unit of locking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub pool: PoolRecord,
    pub positions: BTreeMap<String, Position>,
}

impl PoolEntry {
    pub fn new(pool: PoolRecord) -> Self {
        Self {
            pool,
            positions: BTreeMap::new(),
        }
    }

    /// Accrue every position at the current supply
    ///
    /// Must run before anything changes `total_lp_supply` so earlier
    /// minutes are split by the shares that held during them.
    pub fn accrue_all(&mut self, now_ms: u64) {
        let supply = self.pool.total_lp_supply;
        let rate = self.pool.reward_rate_per_minute;
        for position in self.positions.values_mut() {
            position.accrue(supply, rate, now_ms);
        }
    }
}
