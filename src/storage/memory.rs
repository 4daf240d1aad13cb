use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::domain::{AccountBalance, AccountId, HistoryRecord, Points, TransactionKind};

use super::PointStore;

/// In-process tables for balances and history.
///
/// Each table sits behind its own mutex, held only for the duration of a single
/// access. An optional latency makes every access sleep first, which widens the
/// window between a read and the following write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    balances: Mutex<HashMap<AccountId, AccountBalance>>,
    histories: Mutex<Vec<HistoryRecord>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl PointStore for MemoryStore {
    async fn select_balance(&self, account_id: AccountId) -> Result<AccountBalance> {
        self.pause().await;
        let balances = self
            .balances
            .lock()
            .map_err(|_| anyhow!("balance table lock poisoned"))?;

        Ok(balances
            .get(&account_id)
            .cloned()
            .unwrap_or_else(|| AccountBalance::empty(account_id)))
    }

    async fn upsert_balance(
        &self,
        account_id: AccountId,
        points: Points,
    ) -> Result<AccountBalance> {
        self.pause().await;
        let balance = AccountBalance::new(account_id, points, Utc::now());
        self.balances
            .lock()
            .map_err(|_| anyhow!("balance table lock poisoned"))?
            .insert(account_id, balance.clone());
        Ok(balance)
    }

    async fn insert_history(
        &self,
        account_id: AccountId,
        amount: Points,
        kind: TransactionKind,
        recorded_at: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        self.pause().await;
        let mut histories = self
            .histories
            .lock()
            .map_err(|_| anyhow!("history table lock poisoned"))?;

        let record = HistoryRecord {
            id: histories.len() as i64 + 1,
            account_id,
            amount,
            kind,
            recorded_at,
        };
        histories.push(record.clone());
        Ok(record)
    }

    /// Both tables stay locked for the whole write, so readers never see the
    /// history record without its balance.
    async fn commit(
        &self,
        account_id: AccountId,
        amount: Points,
        kind: TransactionKind,
        new_balance: Points,
        recorded_at: DateTime<Utc>,
    ) -> Result<(AccountBalance, HistoryRecord)> {
        self.pause().await;
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| anyhow!("balance table lock poisoned"))?;
        let mut histories = self
            .histories
            .lock()
            .map_err(|_| anyhow!("history table lock poisoned"))?;

        let record = HistoryRecord {
            id: histories.len() as i64 + 1,
            account_id,
            amount,
            kind,
            recorded_at,
        };
        let balance = AccountBalance::new(account_id, new_balance, Utc::now());

        histories.push(record.clone());
        balances.insert(account_id, balance.clone());
        Ok((balance, record))
    }

    async fn select_history(&self, account_id: AccountId) -> Result<Vec<HistoryRecord>> {
        self.pause().await;
        let histories = self
            .histories
            .lock()
            .map_err(|_| anyhow!("history table lock poisoned"))?;

        Ok(histories
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect())
    }
}
