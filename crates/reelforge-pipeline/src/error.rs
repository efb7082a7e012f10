//! Pipeline error types.

use thiserror::Error;

use reelforge_gen_client::GenError;
use reelforge_ledger::LedgerError;
use reelforge_store::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Script generation failed: {0}")]
    ScriptGeneration(String),

    #[error("Reference analysis failed: {0}")]
    ReferenceAnalysis(String),

    #[error("Audit failed: {0}")]
    Audit(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Insufficient credits: need {needed}, {remaining} remaining")]
    InsufficientCredits { needed: u32, remaining: u32 },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Nothing to export: no completed shots")]
    NothingToExport,

    #[error("Precondition not met: {0}")]
    Precondition(String),

    #[error("Generation service error: {0}")]
    Service(#[from] GenError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub fn script_generation(msg: impl Into<String>) -> Self {
        Self::ScriptGeneration(msg.into())
    }

    pub fn reference_analysis(msg: impl Into<String>) -> Self {
        Self::ReferenceAnalysis(msg.into())
    }

    pub fn audit(msg: impl Into<String>) -> Self {
        Self::Audit(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Cancellation is an informational stop, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }

    /// Errors raised before any mutation, safe to retry after resolving.
    pub fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            PipelineError::InsufficientCredits { .. } | PipelineError::Precondition(_)
        )
    }
}

impl From<LedgerError> for PipelineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientCredits { needed, remaining } => {
                PipelineError::InsufficientCredits { needed, remaining }
            }
            other => PipelineError::Generation(format!("ledger error: {}", other)),
        }
    }
}
