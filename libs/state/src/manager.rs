//! Pool Manager
//!
//! Reads a pool from the repository, prices the action with the engine and
//! writes back the new reserves, all under the pool's exclusive lock.

use crate::error::{PoolStateError, PoolStateResult};
use crate::pool::{PoolEntry, PoolId, PoolRecord, PoolSpec, Position};
use crate::repository::InMemoryPoolRepository;
use crate::traits::PoolRepository;
use amm::precision::round_amount;
use amm::{
    AmmError, AmmPool, LiquidityMath, LiquidityQuote, PriceMath, ProportionalAmounts, SpotPrice,
    SwapDirection, SwapValidator,
};
use amm_config::{AmmConfig, EngineConfig, PoolDefaults};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A swap as submitted by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub direction: SwapDirection,
    pub amount_in: Decimal,
    /// Hard floor on the executed output; takes precedence over
    /// `quoted_amount_out`
    pub min_amount_out: Option<Decimal>,
    /// Output the caller was quoted; execution must stay within the
    /// slippage tolerance of it. With neither bound set the swap executes
    /// at whatever the pool pays.
    pub quoted_amount_out: Option<Decimal>,
    /// Overrides the configured default slippage tolerance
    pub slippage_tolerance: Option<Decimal>,
}

impl SwapRequest {
    pub fn new(direction: SwapDirection, amount_in: Decimal) -> Self {
        Self {
            direction,
            amount_in,
            min_amount_out: None,
            quoted_amount_out: None,
            slippage_tolerance: None,
        }
    }

    pub fn with_min_amount_out(mut self, min_amount_out: Decimal) -> Self {
        self.min_amount_out = Some(min_amount_out);
        self
    }

    pub fn with_quoted_amount_out(mut self, quoted_amount_out: Decimal) -> Self {
        self.quoted_amount_out = Some(quoted_amount_out);
        self
    }

    pub fn with_slippage_tolerance(mut self, slippage: Decimal) -> Self {
        self.slippage_tolerance = Some(slippage);
        self
    }
}

/// Full swap quote shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapDetails {
    pub direction: SwapDirection,
    /// Gross input, protocol fee included
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    /// LP fee retained in the pool
    pub fee: Decimal,
    /// Skimmed from the input before it reaches the pool
    pub protocol_fee: Decimal,
    pub minimum_received: Decimal,
    /// Output per unit of gross input
    pub rate: Decimal,
    pub price_impact: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub details: SwapDetails,
    pub reserve_a: Decimal,
    pub reserve_b: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub quote: LiquidityQuote,
    pub lp_balance: Decimal,
    pub total_lp_supply: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalReceipt {
    pub amount_a: Decimal,
    pub amount_b: Decimal,
    pub share_removed: Decimal,
    pub lp_balance: Decimal,
    pub total_lp_supply: Decimal,
}

/// Display statistics for one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub pool_id: PoolId,
    /// `None` until the pool is funded
    pub spot_price: Option<SpotPrice>,
    pub invariant: Decimal,
    pub total_value_locked: Decimal,
    pub apr_percent: Decimal,
    pub total_lp_supply: Decimal,
    pub position_count: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStats {
    pub pools_created: u64,
    pub swaps_executed: u64,
    pub liquidity_added: u64,
    pub liquidity_removed: u64,
    pub rewards_claimed: u64,
    pub rejected_operations: u64,
}

/// Manages pools stored in a [`PoolRepository`]
pub struct PoolManager<R: PoolRepository = InMemoryPoolRepository> {
    repository: R,
    engine: EngineConfig,
    defaults: PoolDefaults,
    stats: RwLock<ManagerStats>,
}

impl PoolManager<InMemoryPoolRepository> {
    pub fn in_memory(config: &AmmConfig) -> Self {
        Self::new(InMemoryPoolRepository::new(), config)
    }
}

impl<R: PoolRepository> PoolManager<R> {
    pub fn new(repository: R, config: &AmmConfig) -> Self {
        Self {
            repository,
            engine: config.engine.clone(),
            defaults: config.pool_defaults.clone(),
            stats: RwLock::new(ManagerStats::default()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats.read().clone()
    }

    pub fn get_pool(&self, id: &PoolId) -> Option<PoolRecord> {
        self.repository.get(id).map(|entry| entry.pool)
    }

    pub fn list_pools(&self) -> Vec<PoolRecord> {
        self.repository
            .pool_ids()
            .iter()
            .filter_map(|id| self.get_pool(id))
            .collect()
    }

    pub fn position(&self, id: &PoolId, owner: &str) -> Option<Position> {
        self.repository
            .get(id)
            .and_then(|entry| entry.positions.get(owner).cloned())
    }

    /// Register an empty pool; liquidity arrives with the first deposit
    pub fn create_pool(&self, spec: PoolSpec, now_ms: u64) -> PoolStateResult<PoolRecord> {
        let result = self.build_pool(spec, now_ms).and_then(|record| {
            self.repository.insert(PoolEntry::new(record.clone()))?;
            Ok(record)
        });
        let record = self.record("create_pool", result)?;

        self.stats.write().pools_created += 1;
        info!(
            pool = %record.id,
            token_a = %record.token_a,
            token_b = %record.token_b,
            swap_fee = %record.swap_fee,
            "Created pool"
        );
        Ok(record)
    }

    /// Deposit both tokens and mint LP tokens to `owner`
    ///
    /// The first deposit sets the price; later deposits should be
    /// proportional (see [`PoolManager::quote_add_liquidity`]) because only
    /// the limiting side is credited.
    pub fn add_liquidity(
        &self,
        id: &PoolId,
        owner: &str,
        amount_a: Decimal,
        amount_b: Decimal,
        now_ms: u64,
    ) -> PoolStateResult<LiquidityReceipt> {
        let result = self.repository.update(id, |entry| {
            entry.accrue_all(now_ms);

            // Zero supply makes this the bootstrap mint
            let pool = &entry.pool;
            let quote = LiquidityMath::quote_add_liquidity(
                amount_a,
                amount_b,
                pool.reserve_a,
                pool.reserve_b,
                pool.total_lp_supply,
            )?;
            if quote.lp_tokens_minted <= Decimal::ZERO {
                return Err(PoolStateError::InvalidParameters(
                    "deposit too small to mint LP tokens".to_string(),
                ));
            }

            let pool = &mut entry.pool;
            pool.reserve_a = checked_add(pool.reserve_a, amount_a)?;
            pool.reserve_b = checked_add(pool.reserve_b, amount_b)?;
            pool.total_lp_supply = checked_add(pool.total_lp_supply, quote.lp_tokens_minted)?;
            pool.last_update_ms = now_ms;
            let total_lp_supply = pool.total_lp_supply;

            let position = entry
                .positions
                .entry(owner.to_string())
                .or_insert_with(|| Position::new(owner, now_ms));
            position.lp_balance = checked_add(position.lp_balance, quote.lp_tokens_minted)?;

            Ok(LiquidityReceipt {
                quote,
                lp_balance: position.lp_balance,
                total_lp_supply,
            })
        });
        let receipt = self.record("add_liquidity", result)?;

        self.stats.write().liquidity_added += 1;
        info!(
            pool = %id, owner,
            minted = %receipt.quote.lp_tokens_minted,
            share_percent = %receipt.quote.share_after_percent,
            "Added liquidity"
        );
        Ok(receipt)
    }

    /// Counterpart amount for a one-sided input plus the deposit preview
    pub fn quote_add_liquidity(
        &self,
        id: &PoolId,
        input_amount: Decimal,
        input_is_token_a: bool,
    ) -> PoolStateResult<(ProportionalAmounts, LiquidityQuote)> {
        let pool = self.pool_snapshot(id)?;
        if !pool.is_funded() {
            return Err(PoolStateError::InvalidParameters(
                "pool has no liquidity; the first deposit sets the price".to_string(),
            ));
        }

        let amounts = LiquidityMath::proportional_amount(
            input_amount,
            input_is_token_a,
            pool.reserve_a,
            pool.reserve_b,
        )?;
        let quote = LiquidityMath::quote_add_liquidity(
            amounts.amount_a,
            amounts.amount_b,
            pool.reserve_a,
            pool.reserve_b,
            pool.total_lp_supply,
        )?;
        Ok((amounts, quote))
    }

    /// Burn `lp_amount` of `owner`'s LP tokens for a pro rata withdrawal
    pub fn remove_liquidity(
        &self,
        id: &PoolId,
        owner: &str,
        lp_amount: Decimal,
        now_ms: u64,
    ) -> PoolStateResult<RemovalReceipt> {
        let result = self.repository.update(id, |entry| {
            let available = entry
                .positions
                .get(owner)
                .map(|position| position.lp_balance)
                .ok_or_else(|| PoolStateError::PositionNotFound {
                    pool: id.clone(),
                    owner: owner.to_string(),
                })?;
            if lp_amount > available {
                return Err(PoolStateError::InsufficientLpBalance {
                    requested: lp_amount,
                    available,
                });
            }

            entry.accrue_all(now_ms);

            let pool = &mut entry.pool;
            let quote = LiquidityMath::quote_remove_liquidity(
                lp_amount,
                pool.total_lp_supply,
                pool.reserve_a,
                pool.reserve_b,
            )?;
            // The last burn takes the reserves exactly, rounding dust included
            let (amount_a, amount_b) = if lp_amount == pool.total_lp_supply {
                (pool.reserve_a, pool.reserve_b)
            } else {
                (quote.amount_a, quote.amount_b)
            };

            pool.reserve_a -= amount_a;
            pool.reserve_b -= amount_b;
            pool.total_lp_supply -= lp_amount;
            pool.last_update_ms = now_ms;
            let total_lp_supply = pool.total_lp_supply;

            let mut lp_balance = Decimal::ZERO;
            if let Some(position) = entry.positions.get_mut(owner) {
                position.lp_balance -= lp_amount;
                lp_balance = position.lp_balance;
                if position.lp_balance.is_zero() && position.unclaimed_rewards.is_zero() {
                    entry.positions.remove(owner);
                }
            }

            Ok(RemovalReceipt {
                amount_a,
                amount_b,
                share_removed: quote.share_removed,
                lp_balance,
                total_lp_supply,
            })
        });
        let receipt = self.record("remove_liquidity", result)?;

        self.stats.write().liquidity_removed += 1;
        info!(
            pool = %id, owner,
            burned = %lp_amount,
            amount_a = %receipt.amount_a,
            amount_b = %receipt.amount_b,
            "Removed liquidity"
        );
        Ok(receipt)
    }

    /// Price a swap against the current reserves without executing it
    pub fn quote_swap(&self, id: &PoolId, request: &SwapRequest) -> PoolStateResult<SwapDetails> {
        let pool = self.pool_snapshot(id)?;
        self.price_swap(&pool, request)
    }

    /// Gross input needed to receive exactly `amount_out`
    ///
    /// Applies the configured `max_input_to_reserve_ratio` ceiling, if any.
    pub fn quote_exact_output(
        &self,
        id: &PoolId,
        direction: SwapDirection,
        amount_out: Decimal,
    ) -> PoolStateResult<Decimal> {
        let pool = self.pool_snapshot(id)?;
        let net_in = pool.quote_input(direction, amount_out)?;
        let gross_in = net_in
            .checked_div(Decimal::ONE - pool.protocol_fee)
            .ok_or(AmmError::Overflow {
                operation: "division",
            })?;
        let gross_in = round_amount(gross_in);

        if let Some(ratio) = self.engine.max_input_to_reserve_ratio {
            let (reserve_in, _) = pool.reserves().directional(direction);
            let ceiling = reserve_in.checked_mul(ratio).ok_or(AmmError::Overflow {
                operation: "multiplication",
            })?;
            if gross_in > ceiling {
                return Err(PoolStateError::InputCeilingExceeded {
                    required: gross_in,
                    ceiling,
                });
            }
        }
        Ok(gross_in)
    }

    /// Execute a swap, updating reserves and protocol fees atomically
    pub fn swap(
        &self,
        id: &PoolId,
        request: &SwapRequest,
        now_ms: u64,
    ) -> PoolStateResult<SwapReceipt> {
        let result = self.repository.update(id, |entry| {
            let details = self.price_swap(&entry.pool, request)?;
            if let Some(minimum) = self.execution_minimum(request)? {
                if details.amount_out < minimum {
                    return Err(PoolStateError::SlippageExceeded {
                        minimum,
                        actual: details.amount_out,
                    });
                }
            }

            let pool = &mut entry.pool;
            let k_before = PriceMath::pool_invariant(pool.reserve_a, pool.reserve_b)?;
            let old_reserves = (pool.reserve_a, pool.reserve_b);
            let net_in = details.amount_in - details.protocol_fee;
            match details.direction {
                SwapDirection::AToB => {
                    pool.reserve_a = checked_add(pool.reserve_a, net_in)?;
                    pool.reserve_b -= details.amount_out;
                    pool.protocol_fees_a = checked_add(pool.protocol_fees_a, details.protocol_fee)?;
                }
                SwapDirection::BToA => {
                    pool.reserve_b = checked_add(pool.reserve_b, net_in)?;
                    pool.reserve_a -= details.amount_out;
                    pool.protocol_fees_b = checked_add(pool.protocol_fees_b, details.protocol_fee)?;
                }
            }

            let k_after = PriceMath::pool_invariant(pool.reserve_a, pool.reserve_b)?;
            if k_after < k_before
                && !PriceMath::invariant_holds(
                    old_reserves.0,
                    old_reserves.1,
                    pool.reserve_a,
                    pool.reserve_b,
                    self.engine.invariant_tolerance,
                )
            {
                return Err(PoolStateError::InvariantViolated {
                    before: k_before,
                    after: k_after,
                });
            }
            pool.last_update_ms = now_ms;

            Ok(SwapReceipt {
                details,
                reserve_a: pool.reserve_a,
                reserve_b: pool.reserve_b,
            })
        });
        let receipt = self.record("swap", result)?;

        self.stats.write().swaps_executed += 1;
        info!(
            pool = %id,
            direction = ?receipt.details.direction,
            amount_in = %receipt.details.amount_in,
            amount_out = %receipt.details.amount_out,
            price_impact = %receipt.details.price_impact,
            "Executed swap"
        );
        Ok(receipt)
    }

    /// Pay out everything `owner` has accrued up to `now_ms`
    pub fn claim_rewards(&self, id: &PoolId, owner: &str, now_ms: u64) -> PoolStateResult<Decimal> {
        let result = self.repository.update(id, |entry| {
            if !entry.positions.contains_key(owner) {
                return Err(PoolStateError::PositionNotFound {
                    pool: id.clone(),
                    owner: owner.to_string(),
                });
            }
            entry.accrue_all(now_ms);

            let mut claimed = Decimal::ZERO;
            if let Some(position) = entry.positions.get_mut(owner) {
                claimed = std::mem::take(&mut position.unclaimed_rewards);
                if position.lp_balance.is_zero() {
                    entry.positions.remove(owner);
                }
            }
            Ok(claimed)
        });
        let claimed = self.record("claim_rewards", result)?;

        self.stats.write().rewards_claimed += 1;
        info!(pool = %id, owner, %claimed, "Claimed rewards");
        Ok(claimed)
    }

    /// Rewards `owner` could claim at `now_ms`, without claiming them
    pub fn pending_rewards(&self, id: &PoolId, owner: &str, now_ms: u64) -> PoolStateResult<Decimal> {
        let entry = self
            .repository
            .get(id)
            .ok_or_else(|| PoolStateError::PoolNotFound(id.clone()))?;
        let mut position = entry.positions.get(owner).cloned().ok_or_else(|| {
            PoolStateError::PositionNotFound {
                pool: id.clone(),
                owner: owner.to_string(),
            }
        })?;
        position.accrue(
            entry.pool.total_lp_supply,
            entry.pool.reward_rate_per_minute,
            now_ms,
        );
        Ok(position.unclaimed_rewards)
    }

    /// Spot prices, `k`, TVL and APR for display
    ///
    /// Token prices come from an external feed and are used as given.
    pub fn pool_stats(
        &self,
        id: &PoolId,
        price_a: Decimal,
        price_b: Decimal,
        reward_token_price: Decimal,
    ) -> PoolStateResult<PoolStats> {
        let entry = self
            .repository
            .get(id)
            .ok_or_else(|| PoolStateError::PoolNotFound(id.clone()))?;
        let pool = &entry.pool;

        let spot_price = if pool.is_funded() {
            Some(pool.spot_price()?)
        } else {
            None
        };
        let total_value_locked =
            PriceMath::total_value_locked(pool.reserve_a, pool.reserve_b, price_a, price_b);
        let apr_percent = PriceMath::annual_percentage_rate(
            pool.reward_rate_per_minute,
            reward_token_price,
            total_value_locked,
        );

        Ok(PoolStats {
            pool_id: pool.id.clone(),
            spot_price,
            invariant: pool.invariant()?,
            total_value_locked,
            apr_percent,
            total_lp_supply: pool.total_lp_supply,
            position_count: entry.positions.len(),
        })
    }

    fn build_pool(&self, spec: PoolSpec, now_ms: u64) -> PoolStateResult<PoolRecord> {
        if spec.token_a == spec.token_b {
            return Err(PoolStateError::InvalidParameters(format!(
                "pool {} pairs {} with itself",
                spec.id, spec.token_a
            )));
        }
        let swap_fee = spec.swap_fee.unwrap_or(self.defaults.swap_fee);
        let protocol_fee = spec.protocol_fee.unwrap_or(self.defaults.protocol_fee);
        let reward_rate_per_minute = spec
            .reward_rate_per_minute
            .unwrap_or(self.defaults.reward_rate_per_minute);

        for (name, fee) in [("swap fee", swap_fee), ("protocol fee", protocol_fee)] {
            if fee < Decimal::ZERO || fee >= Decimal::ONE {
                return Err(PoolStateError::InvalidParameters(format!(
                    "{} {} is not a fraction in [0, 1)",
                    name, fee
                )));
            }
        }
        if reward_rate_per_minute < Decimal::ZERO {
            return Err(PoolStateError::InvalidParameters(
                "reward rate cannot be negative".to_string(),
            ));
        }

        Ok(PoolRecord {
            id: spec.id,
            token_a: spec.token_a,
            token_b: spec.token_b,
            reserve_a: Decimal::ZERO,
            reserve_b: Decimal::ZERO,
            total_lp_supply: Decimal::ZERO,
            swap_fee,
            protocol_fee,
            protocol_fees_a: Decimal::ZERO,
            protocol_fees_b: Decimal::ZERO,
            reward_rate_per_minute,
            created_at_ms: now_ms,
            last_update_ms: now_ms,
        })
    }

    fn pool_snapshot(&self, id: &PoolId) -> PoolStateResult<PoolRecord> {
        self.get_pool(id)
            .ok_or_else(|| PoolStateError::PoolNotFound(id.clone()))
    }

    /// Protocol fee comes off the gross input first; the rest is priced
    /// with the LP fee
    fn price_swap(&self, pool: &PoolRecord, request: &SwapRequest) -> PoolStateResult<SwapDetails> {
        if !pool.is_funded() {
            return Err(PoolStateError::InvalidParameters(format!(
                "pool {} has no liquidity",
                pool.id
            )));
        }
        let slippage = self.slippage(request)?;

        let amount_in = request.amount_in;
        let protocol_fee = round_amount(amount_in * pool.protocol_fee);
        let net_in = amount_in - protocol_fee;
        let (reserve_in, reserve_out) = pool.reserves().directional(request.direction);

        let validation = SwapValidator::new(pool.swap_fee, self.engine.max_price_impact)
            .validate(net_in, reserve_in, reserve_out);
        if !validation.valid {
            return Err(PoolStateError::ValidationFailed(validation.errors));
        }

        let quote = pool.quote_output(request.direction, net_in)?;
        let details = SwapDetails {
            direction: request.direction,
            amount_in,
            amount_out: quote.amount_out,
            fee: round_amount(net_in * pool.swap_fee),
            protocol_fee,
            minimum_received: round_amount(quote.amount_out * (Decimal::ONE - slippage)),
            rate: round_amount(quote.amount_out / amount_in),
            price_impact: quote.price_impact,
        };
        debug!(pool = %pool.id, ?details, "Priced swap");
        Ok(details)
    }

    fn slippage(&self, request: &SwapRequest) -> PoolStateResult<Decimal> {
        let slippage = request
            .slippage_tolerance
            .unwrap_or(self.engine.default_slippage_tolerance);
        if slippage < Decimal::ZERO || slippage >= Decimal::ONE {
            return Err(PoolStateError::InvalidParameters(format!(
                "slippage tolerance {} is not a fraction in [0, 1)",
                slippage
            )));
        }
        Ok(slippage)
    }

    /// Output floor enforced at execution, if the request sets one
    fn execution_minimum(&self, request: &SwapRequest) -> PoolStateResult<Option<Decimal>> {
        if let Some(minimum) = request.min_amount_out {
            return Ok(Some(minimum));
        }
        let Some(quoted) = request.quoted_amount_out else {
            return Ok(None);
        };
        let minimum = quoted
            .checked_mul(Decimal::ONE - self.slippage(request)?)
            .ok_or(AmmError::Overflow {
                operation: "multiplication",
            })?;
        Ok(Some(round_amount(minimum)))
    }

    fn record<T>(&self, operation: &'static str, result: PoolStateResult<T>) -> PoolStateResult<T> {
        if let Err(e) = &result {
            self.stats.write().rejected_operations += 1;
            warn!(operation, error = %e, "Rejected pool operation");
        }
        result
    }
}

fn checked_add(a: Decimal, b: Decimal) -> PoolStateResult<Decimal> {
    a.checked_add(b).ok_or(PoolStateError::Math(AmmError::Overflow {
        operation: "addition",
    }))
}
