//! The external credit ledger surface.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use reelforge_models::ProjectId;

use crate::error::{LedgerError, LedgerResult};

/// A recorded debit against a project's balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique transaction id
    pub id: String,
    /// Project charged
    pub project_id: ProjectId,
    /// Credits debited
    pub amount: u32,
    /// Human-readable description ("Shot S02 (standard)")
    pub description: String,
    /// Balance after the debit
    pub balance_after: u32,
    /// When the debit happened
    pub created_at: DateTime<Utc>,
}

/// External credit ledger: balance checks and debits, keyed by project.
///
/// The ledger is consulted, never owned, by the pipeline. Debits must be
/// atomic with respect to the returned balance.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance for a project.
    async fn balance(&self, project_id: &ProjectId) -> LedgerResult<u32>;

    /// Debit credits; returns the new balance. Fails without mutating when
    /// the balance is short.
    async fn debit(
        &self,
        project_id: &ProjectId,
        amount: u32,
        description: &str,
    ) -> LedgerResult<u32>;
}

/// In-memory ledger for tests and local runs.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Arc<RwLock<MemoryLedgerState>>,
}

#[derive(Default)]
struct MemoryLedgerState {
    balances: HashMap<ProjectId, u32>,
    transactions: Vec<CreditTransaction>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project's balance.
    pub async fn set_balance(&self, project_id: &ProjectId, balance: u32) {
        let mut state = self.inner.write().await;
        state.balances.insert(project_id.clone(), balance);
    }

    /// All recorded transactions, oldest first.
    pub async fn transactions(&self) -> Vec<CreditTransaction> {
        self.inner.read().await.transactions.clone()
    }
}

#[async_trait]
impl CreditLedger for MemoryLedger {
    async fn balance(&self, project_id: &ProjectId) -> LedgerResult<u32> {
        let state = self.inner.read().await;
        Ok(state.balances.get(project_id).copied().unwrap_or(0))
    }

    async fn debit(
        &self,
        project_id: &ProjectId,
        amount: u32,
        description: &str,
    ) -> LedgerResult<u32> {
        let mut state = self.inner.write().await;
        let balance = state.balances.get(project_id).copied().unwrap_or(0);
        if amount > balance {
            return Err(LedgerError::InsufficientCredits {
                needed: amount,
                remaining: balance,
            });
        }

        let new_balance = balance - amount;
        state.balances.insert(project_id.clone(), new_balance);
        state.transactions.push(CreditTransaction {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.clone(),
            amount,
            description: description.to_string(),
            balance_after: new_balance,
            created_at: Utc::now(),
        });

        debug!(
            project_id = %project_id,
            amount = amount,
            balance = new_balance,
            "Debited credits"
        );
        Ok(new_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_debit_reduces_balance() {
        let ledger = MemoryLedger::new();
        let project = ProjectId::new();
        ledger.set_balance(&project, 25).await;

        let balance = ledger.debit(&project, 10, "Shot S01 (standard)").await.unwrap();
        assert_eq!(balance, 15);
        assert_eq!(ledger.balance(&project).await.unwrap(), 15);
        assert_eq!(ledger.transactions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_short_balance_rejects_without_mutation() {
        let ledger = MemoryLedger::new();
        let project = ProjectId::new();
        ledger.set_balance(&project, 5).await;

        let err = ledger.debit(&project, 10, "Shot S01 (standard)").await.unwrap_err();
        assert!(err.is_insufficient());
        assert_eq!(ledger.balance(&project).await.unwrap(), 5);
        assert!(ledger.transactions().await.is_empty());
    }
}
