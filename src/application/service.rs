use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::{
    replay_balance, AccountBalance, AccountId, HistoryRecord, Points, TransactionKind,
    DEFAULT_MAX_BALANCE,
};
use crate::storage::PointStore;

use super::{LedgerError, LockRegistry};

/// Tunable limits of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Highest balance a charge may produce.
    pub max_balance: Points,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_balance: DEFAULT_MAX_BALANCE,
        }
    }
}

/// Result of comparing a stored balance with its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCheck {
    pub balance: AccountBalance,
    pub replayed: Points,
    pub history_len: usize,
    pub consistent: bool,
}

/// Application service for charging and using points.
///
/// Every mutation runs as read-check-write while holding the account's lock from
/// the registry, so mutations on one account are applied one at a time in lock
/// acquisition order. Different accounts never contend. Reads take no lock.
pub struct LedgerService<S> {
    store: S,
    locks: LockRegistry,
    config: LedgerConfig,
}

impl<S: PointStore> LedgerService<S> {
    /// Create a new ledger service with the given store and lock registry.
    pub fn new(store: S, locks: LockRegistry) -> Self {
        Self {
            store,
            locks,
            config: LedgerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> LedgerConfig {
        self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// Credit `amount` points. Fails if the result would exceed the balance cap.
    pub async fn charge(
        &self,
        account_id: AccountId,
        amount: Points,
    ) -> Result<AccountBalance, LedgerError> {
        let max_balance = self.config.max_balance;
        self.apply(account_id, amount, TransactionKind::Charge, |current| {
            current
                .checked_add(amount)
                .filter(|next| *next <= max_balance)
                .ok_or(LedgerError::MaxBalanceExceeded)
        })
        .await
    }

    /// Debit `amount` points. Fails if the balance would drop below zero.
    pub async fn use_points(
        &self,
        account_id: AccountId,
        amount: Points,
    ) -> Result<AccountBalance, LedgerError> {
        self.apply(account_id, amount, TransactionKind::Use, |current| {
            current
                .checked_sub(amount)
                .filter(|next| *next >= 0)
                .ok_or(LedgerError::InsufficientBalance)
        })
        .await
    }

    pub async fn get_balance(&self, account_id: AccountId) -> Result<AccountBalance, LedgerError> {
        Ok(self.store.select_balance(account_id).await?)
    }

    pub async fn get_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<HistoryRecord>, LedgerError> {
        Ok(self.store.select_history(account_id).await?)
    }

    /// Verify that an account's stored balance equals the sum of its history.
    pub async fn check_account(&self, account_id: AccountId) -> Result<AccountCheck, LedgerError> {
        let lock = self.locks.acquire_lock(account_id);
        let _guard = lock.lock().await;

        let balance = self.store.select_balance(account_id).await?;
        let history = self.store.select_history(account_id).await?;
        let replayed = replay_balance(&history);

        Ok(AccountCheck {
            consistent: replayed == balance.points,
            replayed,
            history_len: history.len(),
            balance,
        })
    }

    async fn apply<F>(
        &self,
        account_id: AccountId,
        amount: Points,
        kind: TransactionKind,
        next_balance: F,
    ) -> Result<AccountBalance, LedgerError>
    where
        F: FnOnce(Points) -> Result<Points, LedgerError>,
    {
        // Depends on no shared state, so it runs before taking the lock.
        if amount <= 0 {
            warn!(account_id, amount, %kind, "rejected non-positive amount");
            return Err(LedgerError::NonPositiveAmount);
        }

        let lock = self.locks.acquire_lock(account_id);
        let _guard = lock.lock().await;
        debug!(account_id, %kind, "account lock acquired");

        let current = self.store.select_balance(account_id).await?;
        let new_balance = match next_balance(current.points) {
            Ok(points) => points,
            Err(err) => {
                warn!(
                    account_id,
                    amount,
                    balance = current.points,
                    %kind,
                    code = err.code(),
                    "rejected mutation: {}",
                    err
                );
                return Err(err);
            }
        };

        let (balance, record) = self
            .store
            .commit(account_id, amount, kind, new_balance, Utc::now())
            .await?;

        info!(
            account_id,
            amount,
            balance = balance.points,
            history_id = record.id,
            %kind,
            "mutation applied"
        );
        Ok(balance)
    }
}
