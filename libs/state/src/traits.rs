//! Pool repository abstraction
//!
//! The engine is stateless; a repository owns pool state and serializes
//! mutation per pool.

use crate::error::PoolStateResult;
use crate::pool::{PoolEntry, PoolId};

/// Storage for pool entries with per-pool exclusive updates
pub trait PoolRepository: Send + Sync {
    /// Add a new pool; fails with `PoolExists` on a duplicate id
    fn insert(&self, entry: PoolEntry) -> PoolStateResult<()>;

    /// Snapshot of a pool and its positions
    fn get(&self, id: &PoolId) -> Option<PoolEntry>;

    /// Run `apply` with exclusive access to one pool
    ///
    /// Changes are committed only when `apply` returns `Ok`; concurrent
    /// updates of the same pool run one after another.
    fn update<T, F>(&self, id: &PoolId, apply: F) -> PoolStateResult<T>
    where
        F: FnOnce(&mut PoolEntry) -> PoolStateResult<T>;

    /// All known pool ids, sorted
    fn pool_ids(&self) -> Vec<PoolId>;
}
