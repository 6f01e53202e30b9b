//! Concurrent access through the in-memory repository
//!
//! Swaps against one pool must serialize: every receipt observes the
//! reserves left by exactly one predecessor, and the final reserves equal
//! the initial ones plus the sum of all net flows.

use amm::{PriceMath, SwapDirection};
use amm_config::AmmConfig;
use pool_state::{PoolId, PoolManager, PoolSpec, SwapRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::thread;

const THREADS: usize = 8;
const SWAPS_PER_THREAD: usize = 50;

fn funded_manager(pools: &[&str]) -> PoolManager {
    let manager = PoolManager::in_memory(&AmmConfig::default());
    for id in pools {
        manager.create_pool(PoolSpec::new(*id, "ETH", "USDC"), 0).unwrap();
        manager
            .add_liquidity(&PoolId::from(*id), "seed", dec!(1000000), dec!(250000), 0)
            .unwrap();
    }
    manager
}

#[test]
fn swaps_on_one_pool_serialize() {
    let manager = funded_manager(&["ETH-USDC"]);
    let id = PoolId::from("ETH-USDC");
    let before = manager.get_pool(&id).unwrap();

    let receipts: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let manager = &manager;
                let id = &id;
                scope.spawn(move || {
                    (0..SWAPS_PER_THREAD)
                        .map(|i| {
                            let direction = if (t + i) % 2 == 0 {
                                SwapDirection::AToB
                            } else {
                                SwapDirection::BToA
                            };
                            let amount = Decimal::from(10 + t as u64 * 3 + i as u64);
                            let request = SwapRequest::new(direction, amount);
                            manager.swap(id, &request, (t * 1000 + i) as u64).unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(receipts.len(), THREADS * SWAPS_PER_THREAD);
    assert_eq!(manager.stats().swaps_executed, (THREADS * SWAPS_PER_THREAD) as u64);

    let mut expected_a = before.reserve_a;
    let mut expected_b = before.reserve_b;
    let mut fees_a = Decimal::ZERO;
    let mut fees_b = Decimal::ZERO;
    for receipt in &receipts {
        let details = receipt.details;
        let net_in = details.amount_in - details.protocol_fee;
        match details.direction {
            SwapDirection::AToB => {
                expected_a += net_in;
                expected_b -= details.amount_out;
                fees_a += details.protocol_fee;
            }
            SwapDirection::BToA => {
                expected_b += net_in;
                expected_a -= details.amount_out;
                fees_b += details.protocol_fee;
            }
        }
    }

    let after = manager.get_pool(&id).unwrap();
    assert_eq!(after.reserve_a, expected_a);
    assert_eq!(after.reserve_b, expected_b);
    assert_eq!(after.protocol_fees_a, fees_a);
    assert_eq!(after.protocol_fees_b, fees_b);
    assert_eq!(after.total_lp_supply, before.total_lp_supply);
    assert!(after.reserve_a * after.reserve_b > before.reserve_a * before.reserve_b);

    // No two swaps saw the same pre-trade state, so no two post-trade
    // reserve pairs coincide
    let mut states: Vec<(Decimal, Decimal)> =
        receipts.iter().map(|r| (r.reserve_a, r.reserve_b)).collect();
    states.sort();
    states.dedup();
    assert_eq!(states.len(), receipts.len());
}

#[test]
fn independent_pools_progress_in_parallel() {
    let ids = ["P0", "P1", "P2", "P3"];
    let manager = funded_manager(&ids);

    thread::scope(|scope| {
        for id in ids {
            let manager = &manager;
            scope.spawn(move || {
                let id = PoolId::from(id);
                for i in 0..SWAPS_PER_THREAD {
                    let request = SwapRequest::new(SwapDirection::AToB, dec!(100));
                    manager.swap(&id, &request, i as u64).unwrap();
                }
            });
        }
    });

    // Identical histories on identical pools end in identical states
    let pools = manager.list_pools();
    assert_eq!(pools.len(), ids.len());
    for pool in &pools[1..] {
        assert_eq!(pool.reserve_a, pools[0].reserve_a);
        assert_eq!(pool.reserve_b, pools[0].reserve_b);
    }
    assert!(PriceMath::pool_invariant(pools[0].reserve_a, pools[0].reserve_b).unwrap()
        > dec!(250000000000));
}

#[test]
fn deposits_and_claims_from_many_owners() {
    let mut config = AmmConfig::default();
    config.pool_defaults.reward_rate_per_minute = dec!(1);
    let manager = PoolManager::in_memory(&config);
    manager.create_pool(PoolSpec::new("LP", "A", "B"), 0).unwrap();
    let id = PoolId::from("LP");
    manager
        .add_liquidity(&id, "seed", dec!(1000), dec!(1000), 0)
        .unwrap();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let manager = &manager;
            let id = &id;
            scope.spawn(move || {
                let owner = format!("owner-{t}");
                manager
                    .add_liquidity(id, &owner, dec!(100), dec!(100), 0)
                    .unwrap();
            });
        }
    });

    let pool = manager.get_pool(&id).unwrap();
    assert_eq!(pool.total_lp_supply, dec!(1800));
    assert_eq!(pool.reserve_a, dec!(1800));

    // 60 minutes at 1/min split across 1800 LP tokens
    let mut claimed = Decimal::ZERO;
    for t in 0..THREADS {
        claimed += manager
            .claim_rewards(&id, &format!("owner-{t}"), 3_600_000)
            .unwrap();
    }
    claimed += manager.claim_rewards(&id, "seed", 3_600_000).unwrap();
    assert!((claimed - dec!(60)).abs() <= dec!(0.0000001));
}
