use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Points};

/// The current point balance of one account.
/// An account that was never written reads as an empty balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub points: Points,
    /// When the balance was last written; `None` until the first mutation.
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccountBalance {
    pub fn new(account_id: AccountId, points: Points, updated_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            points,
            updated_at: Some(updated_at),
        }
    }

    pub fn empty(account_id: AccountId) -> Self {
        Self {
            account_id,
            points: 0,
            updated_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.updated_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_balance() {
        let balance = AccountBalance::empty(7);
        assert_eq!(balance.account_id, 7);
        assert_eq!(balance.points, 0);
        assert!(balance.is_empty());
        assert_eq!(balance, AccountBalance::empty(7));
    }

    #[test]
    fn test_written_balance() {
        let balance = AccountBalance::new(7, 1200, Utc::now());
        assert_eq!(balance.points, 1200);
        assert!(!balance.is_empty());
    }
}
