// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use pointledger::application::{LedgerError, LedgerService, LockRegistry};
use pointledger::domain::{AccountBalance, AccountId, HistoryRecord, Points, TransactionKind};
use pointledger::storage::{MemoryStore, PointStore, SqliteStore};
use tempfile::TempDir;

/// Helper to create a service over the in-memory store
pub fn memory_service() -> LedgerService<MemoryStore> {
    LedgerService::new(MemoryStore::new(), LockRegistry::new())
}

/// Helper to create a service whose store sleeps on every access,
/// so unserialized read-modify-write sequences would interleave
pub fn slow_memory_service() -> LedgerService<MemoryStore> {
    LedgerService::new(
        MemoryStore::new().with_latency(Duration::from_millis(2)),
        LockRegistry::new(),
    )
}

/// Helper to create a test service with a temporary database
pub async fn sqlite_service() -> Result<(LedgerService<SqliteStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::init(db_path.to_str().unwrap()).await?;
    Ok((LedgerService::new(store, LockRegistry::new()), temp_dir))
}

/// Store whose every operation fails, standing in for an unreachable database
pub struct FailingStore;

impl PointStore for FailingStore {
    async fn select_balance(&self, _account_id: AccountId) -> Result<AccountBalance> {
        Err(anyhow!("connection refused"))
    }

    async fn upsert_balance(
        &self,
        _account_id: AccountId,
        _points: Points,
    ) -> Result<AccountBalance> {
        Err(anyhow!("connection refused"))
    }

    async fn insert_history(
        &self,
        _account_id: AccountId,
        _amount: Points,
        _kind: TransactionKind,
        _recorded_at: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        Err(anyhow!("connection refused"))
    }

    async fn select_history(&self, _account_id: AccountId) -> Result<Vec<HistoryRecord>> {
        Err(anyhow!("connection refused"))
    }
}

/// Tally of calls against one account
#[derive(Debug, Default)]
pub struct Outcome {
    pub charged: Points,
    pub used: Points,
    pub applied: usize,
    /// Error codes of rejected calls
    pub rejected: Vec<&'static str>,
}

impl Outcome {
    pub fn record(
        &mut self,
        kind: TransactionKind,
        amount: Points,
        result: &Result<AccountBalance, LedgerError>,
    ) {
        match result {
            Ok(_) => {
                self.applied += 1;
                match kind {
                    TransactionKind::Charge => self.charged += amount,
                    TransactionKind::Use => self.used += amount,
                }
            }
            Err(err) => {
                assert!(err.is_validation(), "unexpected store error: {}", err);
                self.rejected.push(err.code());
            }
        }
    }

    pub fn net(&self) -> Points {
        self.charged - self.used
    }
}

/// Assert that an account's state is exactly what its successful calls imply.
/// `outcome` must cover every call ever made against the account.
pub async fn assert_consistent<S: PointStore>(
    service: &LedgerService<S>,
    account_id: AccountId,
    outcome: &Outcome,
) {
    let balance = service.get_balance(account_id).await.unwrap();
    let history = service.get_history(account_id).await.unwrap();

    assert_eq!(balance.points, outcome.net());
    assert!(balance.points >= 0);
    assert!(balance.points <= service.config().max_balance);
    assert_eq!(history.len(), outcome.applied);

    let check = service.check_account(account_id).await.unwrap();
    assert!(check.consistent);
}
