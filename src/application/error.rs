use thiserror::Error;

/// Broad classification of a ledger failure, used by transport adapters to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was rejected; retrying it unchanged will fail again.
    InvalidInput,
    /// The store could not serve the request.
    Infrastructure,
}

impl ErrorKind {
    /// HTTP-style status code for this class of error.
    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::Infrastructure => 500,
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("balance cap exceeded")]
    MaxBalanceExceeded,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("store unavailable: {0}")]
    Store(#[from] anyhow::Error),
}

impl LedgerError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NonPositiveAmount => "E101",
            LedgerError::MaxBalanceExceeded => "E102",
            LedgerError::InsufficientBalance => "E103",
            LedgerError::Store(_) => "E500",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Store(_) => ErrorKind::Infrastructure,
            _ => ErrorKind::InvalidInput,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }
}
