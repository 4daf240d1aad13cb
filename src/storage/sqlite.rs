use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::domain::{AccountBalance, AccountId, HistoryRecord, Points, TransactionKind};

use super::{PointStore, MIGRATION_001_INITIAL};

/// How long a writer waits for SQLite's write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store for balances and history.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_path: &str) -> Result<Self> {
        let store = Self::connect(database_path).await?;
        store.migrate().await?;
        Ok(store)
    }

    async fn write_balance(
        conn: &mut SqliteConnection,
        account_id: AccountId,
        points: Points,
    ) -> Result<AccountBalance> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO user_points (account_id, points, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (account_id) DO UPDATE
            SET points = excluded.points, updated_at = excluded.updated_at
            "#,
        )
        .bind(account_id)
        .bind(points)
        .bind(now.to_rfc3339())
        .execute(&mut *conn)
        .await
        .context("Failed to upsert balance")?;

        Ok(AccountBalance::new(account_id, points, now))
    }

    async fn write_history(
        conn: &mut SqliteConnection,
        account_id: AccountId,
        amount: Points,
        kind: TransactionKind,
        recorded_at: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO point_histories (account_id, amount, kind, recorded_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .bind(kind.as_str())
        .bind(recorded_at.to_rfc3339())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert history record")?;

        Ok(HistoryRecord {
            id: row.get("id"),
            account_id,
            amount,
            kind,
            recorded_at,
        })
    }

    fn row_to_balance(row: &SqliteRow) -> Result<AccountBalance> {
        let updated_at_str: String = row.get("updated_at");

        Ok(AccountBalance {
            account_id: row.get("account_id"),
            points: row.get("points"),
            updated_at: Some(
                parse_timestamp(&updated_at_str).context("Invalid updated_at timestamp")?,
            ),
        })
    }

    fn row_to_history(row: &SqliteRow) -> Result<HistoryRecord> {
        let kind_str: String = row.get("kind");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(HistoryRecord {
            id: row.get("id"),
            account_id: row.get("account_id"),
            amount: row.get("amount"),
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            recorded_at: parse_timestamp(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

impl PointStore for SqliteStore {
    async fn select_balance(&self, account_id: AccountId) -> Result<AccountBalance> {
        let row = sqlx::query(
            "SELECT account_id, points, updated_at FROM user_points WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch balance")?;

        match row {
            Some(row) => Self::row_to_balance(&row),
            None => Ok(AccountBalance::empty(account_id)),
        }
    }

    async fn upsert_balance(
        &self,
        account_id: AccountId,
        points: Points,
    ) -> Result<AccountBalance> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        Self::write_balance(&mut conn, account_id, points).await
    }

    async fn insert_history(
        &self,
        account_id: AccountId,
        amount: Points,
        kind: TransactionKind,
        recorded_at: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        Self::write_history(&mut conn, account_id, amount, kind, recorded_at).await
    }

    async fn select_history(&self, account_id: AccountId) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount, kind, recorded_at
            FROM point_histories
            WHERE account_id = ?
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list history")?;

        rows.iter().map(Self::row_to_history).collect()
    }

    /// Both writes share one SQL transaction, so a failure leaves neither behind.
    async fn commit(
        &self,
        account_id: AccountId,
        amount: Points,
        kind: TransactionKind,
        new_balance: Points,
        recorded_at: DateTime<Utc>,
    ) -> Result<(AccountBalance, HistoryRecord)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let record = Self::write_history(&mut tx, account_id, amount, kind, recorded_at).await?;
        let balance = Self::write_balance(&mut tx, account_id, new_balance).await?;

        tx.commit().await.context("Failed to commit transaction")?;
        Ok((balance, record))
    }
}
