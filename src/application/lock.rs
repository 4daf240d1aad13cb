use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::AccountId;

/// Hands out one mutex per account id.
///
/// Handles are created lazily on first request and live as long as the registry.
/// `DashMap::entry` holds the shard's write lock while inserting, so two callers
/// racing on a new id always end up with the same handle. The returned mutex is
/// async because the ledger awaits store I/O while holding it.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for an account, creating it if this id has not been seen yet.
    pub fn acquire_lock(&self, account_id: AccountId) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of accounts that currently have a lock handle.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
