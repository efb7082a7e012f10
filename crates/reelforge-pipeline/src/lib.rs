//! Production pipeline orchestrator.
//!
//! Drives an approved shot list through per-shot video generation under
//! hard consistency constraints: the end frame of shot *i* seeds shot
//! *i+1*, the generation seed is locked once per run, and the character
//! bible rides on every call. A quality-scoring gate retries rejected
//! attempts with corrective prompts, credits are charged exactly once per
//! completed shot, and cancellation is observed at every suspension point.
//!
//! Pipeline stages:
//! 1. [`ScriptBreakdownEngine`] — synopsis → ordered shot list
//! 2. [`ReferenceAnchorAnalyzer`] — reference image → character bible
//! 3. [`CinematicAuditor`] — pre-production critique + approval gate
//! 4. [`ProductionOrchestrator`] — the per-shot generation state machine
//! 5. [`ReviewAssembler`] — completed shots → playable/exportable sequence

pub mod anchor;
pub mod audit;
pub mod breakdown;
pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod review;

pub use anchor::ReferenceAnchorAnalyzer;
pub use audit::CinematicAuditor;
pub use breakdown::{BreakdownOutcome, ScriptBreakdownEngine};
pub use cancel::{CancelSignal, CancelToken};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{ProductionContext, ProductionOrchestrator, RunOutcome};
pub use progress::ProgressChannel;
pub use review::{ReviewAssembler, ReviewSequence, SequenceEntry};
