use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::application::{LedgerError, LedgerService};
use crate::domain::{AccountId, Points, TransactionKind};
use crate::storage::PointStore;

/// A single charge or use to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: TransactionKind,
    pub account: AccountId,
    pub amount: Points,
}

/// Internal shape used only for CSV deserialization: `kind,account,amount`
#[derive(Debug, Deserialize)]
struct CsvOperation {
    kind: String,
    account: AccountId,
    amount: Points,
}

impl TryFrom<CsvOperation> for Operation {
    type Error = anyhow::Error;

    fn try_from(row: CsvOperation) -> Result<Self> {
        let kind = TransactionKind::from_str(&row.kind)
            .ok_or_else(|| anyhow::anyhow!("Unknown operation kind: {}", row.kind))?;

        Ok(Operation {
            kind,
            account: row.account,
            amount: row.amount,
        })
    }
}

/// An operation the ledger refused, with the row it came from
#[derive(Debug, Clone)]
pub struct RejectedOperation {
    pub line: usize,
    pub account: AccountId,
    pub amount: Points,
    pub code: String,
    pub error: String,
}

/// Outcome of a replay
#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: Vec<RejectedOperation>,
}

/// Read operations from CSV. Rows that fail to parse abort the whole read.
pub fn read_operations<R: Read>(reader: R) -> Result<Vec<Operation>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<CsvOperation>()
        .enumerate()
        .map(|(index, row)| {
            row.map_err(anyhow::Error::from)
                .and_then(Operation::try_from)
                .with_context(|| format!("Invalid operation on line {}", index + 2))
        })
        .collect()
}

/// Apply all operations concurrently, one task per row.
///
/// Operations on the same account are serialized by the ledger; the order in
/// which they win the account lock is not the file order.
pub async fn replay<S>(
    service: Arc<LedgerService<S>>,
    operations: Vec<Operation>,
) -> Result<ReplaySummary>
where
    S: PointStore + 'static,
{
    let mut tasks = JoinSet::new();

    for (index, op) in operations.into_iter().enumerate() {
        let service = Arc::clone(&service);
        let line = index + 2; // +2 for header and 0-indexing
        tasks.spawn(async move {
            let result = match op.kind {
                TransactionKind::Charge => service.charge(op.account, op.amount).await,
                TransactionKind::Use => service.use_points(op.account, op.amount).await,
            };

            result.map(|_| ()).map_err(|err: LedgerError| RejectedOperation {
                line,
                account: op.account,
                amount: op.amount,
                code: err.code().to_string(),
                error: err.to_string(),
            })
        });
    }

    let mut summary = ReplaySummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined.context("Replay task panicked")? {
            Ok(()) => summary.applied += 1,
            Err(rejected) => summary.rejected.push(rejected),
        }
    }
    summary.rejected.sort_by_key(|r| r.line);

    Ok(summary)
}
