//! Ledger error types.

use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Insufficient credits: need {needed}, {remaining} remaining")]
    InsufficientCredits { needed: u32, remaining: u32 },

    #[error("No reservation for shot {0}")]
    ReservationMissing(String),

    #[error("Ledger operation failed: {0}")]
    Ledger(String),
}

impl LedgerError {
    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, LedgerError::InsufficientCredits { .. })
    }
}
