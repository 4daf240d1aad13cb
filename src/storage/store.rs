use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::domain::{AccountBalance, AccountId, HistoryRecord, Points, TransactionKind};

/// Storage contract the ledger needs for balances and their history.
///
/// The store does no validation and no locking of its own; callers that need a
/// read-check-write sequence to be atomic must serialize it themselves.
pub trait PointStore: Send + Sync {
    /// Current balance, or an empty balance for an account never written.
    fn select_balance(
        &self,
        account_id: AccountId,
    ) -> impl Future<Output = Result<AccountBalance>> + Send;

    /// Create or replace the balance, stamping the current time.
    fn upsert_balance(
        &self,
        account_id: AccountId,
        points: Points,
    ) -> impl Future<Output = Result<AccountBalance>> + Send;

    /// Append a history record and return it with its assigned sequence number.
    fn insert_history(
        &self,
        account_id: AccountId,
        amount: Points,
        kind: TransactionKind,
        recorded_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<HistoryRecord>> + Send;

    /// All records for an account, oldest first.
    fn select_history(
        &self,
        account_id: AccountId,
    ) -> impl Future<Output = Result<Vec<HistoryRecord>>> + Send;

    /// Write one mutation: append its history record, then store the new balance.
    ///
    /// The default runs the two writes one after the other and cannot undo the
    /// history append if the balance write fails. Adapters override it to make
    /// both writes one unit.
    fn commit(
        &self,
        account_id: AccountId,
        amount: Points,
        kind: TransactionKind,
        new_balance: Points,
        recorded_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(AccountBalance, HistoryRecord)>> + Send {
        async move {
            let record = self
                .insert_history(account_id, amount, kind, recorded_at)
                .await?;
            let balance = self.upsert_balance(account_id, new_balance).await?;
            Ok((balance, record))
        }
    }
}
