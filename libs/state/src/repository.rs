//! In-memory pool repository
//!
//! One `Mutex` per pool inside a `DashMap`: swaps on the same pool
//! serialize while different pools proceed in parallel.

use crate::error::{PoolStateError, PoolStateResult};
use crate::pool::{PoolEntry, PoolId};
use crate::traits::PoolRepository;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
pub struct InMemoryPoolRepository {
    pools: DashMap<PoolId, Arc<Mutex<PoolEntry>>>,
}

impl InMemoryPoolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    fn handle(&self, id: &PoolId) -> Option<Arc<Mutex<PoolEntry>>> {
        // Clone the Arc so the shard lock is released before the pool lock is taken
        self.pools.get(id).map(|pool| Arc::clone(pool.value()))
    }
}

impl PoolRepository for InMemoryPoolRepository {
    fn insert(&self, entry: PoolEntry) -> PoolStateResult<()> {
        match self.pools.entry(entry.pool.id.clone()) {
            Entry::Occupied(occupied) => Err(PoolStateError::PoolExists(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                debug!(pool = %entry.pool.id, "stored new pool");
                vacant.insert(Arc::new(Mutex::new(entry)));
                Ok(())
            }
        }
    }

    fn get(&self, id: &PoolId) -> Option<PoolEntry> {
        self.handle(id).map(|pool| pool.lock().clone())
    }

    fn update<T, F>(&self, id: &PoolId, apply: F) -> PoolStateResult<T>
    where
        F: FnOnce(&mut PoolEntry) -> PoolStateResult<T>,
    {
        let pool = self
            .handle(id)
            .ok_or_else(|| PoolStateError::PoolNotFound(id.clone()))?;
        let mut guard = pool.lock();

        let mut draft = guard.clone();
        let output = apply(&mut draft)?;
        *guard = draft;
        Ok(output)
    }

    fn pool_ids(&self) -> Vec<PoolId> {
        let mut ids: Vec<PoolId> = self.pools.iter().map(|pool| pool.key().clone()).collect();
        ids.sort();
        ids
    }
}
