//! Shared data models for the ReelForge production pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Shots and their generation lifecycle
//! - Production run state (frame chaining, seed lock, voice tracks)
//! - Reference anchors and character bibles
//! - Audit results and corrective suggestions
//! - Quality tiers and audio mix modes
//! - Project records and progress events

pub mod anchor;
pub mod audit;
pub mod event;
pub mod mix;
pub mod production;
pub mod project;
pub mod shot;
pub mod tier;

// Re-export common types
pub use anchor::{CharacterBible, MasterAnchor};
pub use audit::{AuditResult, ShotSuggestion};
pub use event::ProductionEvent;
pub use mix::AudioMixMode;
pub use production::{ChainContext, ProductionState, VoiceStatus, VoiceTrack};
pub use project::{BreakdownRequest, Project, ProjectId, ProjectStatus};
pub use shot::{Shot, ShotId, ShotStatus, VisualDebugResult};
pub use tier::QualityTier;
