use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Points};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Points credited to the account
    Charge,
    /// Points debited from the account
    Use,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Charge => "CHARGE",
            TransactionKind::Use => "USE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CHARGE" => Some(TransactionKind::Charge),
            "USE" => Some(TransactionKind::Use),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One applied mutation. Records are append-only and never change once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Auto-incrementing sequence number assigned by the store
    pub id: i64,
    pub account_id: AccountId,
    /// Always positive; the direction comes from `kind`
    pub amount: Points,
    pub kind: TransactionKind,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn signed_amount(&self) -> Points {
        match self.kind {
            TransactionKind::Charge => self.amount,
            TransactionKind::Use => -self.amount,
        }
    }
}

/// Rebuild a balance from its history, oldest record first.
pub fn replay_balance(records: &[HistoryRecord]) -> Points {
    records.iter().map(HistoryRecord::signed_amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, amount: Points, kind: TransactionKind) -> HistoryRecord {
        HistoryRecord {
            id,
            account_id: 1,
            amount,
            kind,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(TransactionKind::Charge.as_str(), "CHARGE");
        assert_eq!(TransactionKind::Use.to_string(), "USE");
        assert_eq!(TransactionKind::from_str("charge"), Some(TransactionKind::Charge));
        assert_eq!(TransactionKind::from_str(" use "), Some(TransactionKind::Use));
        assert_eq!(TransactionKind::from_str("refund"), None);
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&TransactionKind::Charge).unwrap();
        assert_eq!(json, "\"CHARGE\"");
        let kind: TransactionKind = serde_json::from_str("\"USE\"").unwrap();
        assert_eq!(kind, TransactionKind::Use);
    }

    #[test]
    fn test_replay_balance() {
        let records = vec![
            record(1, 1000, TransactionKind::Charge),
            record(2, 300, TransactionKind::Use),
            record(3, 50, TransactionKind::Charge),
        ];
        assert_eq!(replay_balance(&records), 750);
        assert_eq!(replay_balance(&[]), 0);
    }
}
