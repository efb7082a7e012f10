//! Production run state.
//!
//! One `ProductionState` exists per project run. It owns the shot list for
//! the duration of production, the frame-chaining context, and the
//! re-entrancy guard. It is created when the audit is approved and archived
//! when every shot is terminal or the user abandons the run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{MasterAnchor, QualityTier, Shot, ShotId, ShotStatus};
use crate::project::ProjectId;

/// Frame-chaining context threaded through the run.
///
/// `seed` is assigned exactly once, at first production start (seed lock).
/// `previous_frame_url` is mutated only on shot success, always to the
/// just-completed shot's end frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ChainContext {
    /// End frame of the last completed shot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_frame_url: Option<String>,
    /// Generation seed, fixed for the whole run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ChainContext {
    /// Lock the seed if it has not been locked yet. Returns the seed in
    /// effect after the call.
    pub fn lock_seed(&mut self, seed: u64) -> u64 {
        *self.seed.get_or_insert(seed)
    }
}

/// Voice generation state for one shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoiceStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Generated voice track for a shot with dialogue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VoiceTrack {
    /// Shot the track belongs to
    pub shot_id: ShotId,
    /// Generation state
    #[serde(default)]
    pub status: VoiceStatus,
    /// Generated audio URL (set only on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// State of one production run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductionState {
    /// Project this run belongs to
    pub project_id: ProjectId,

    /// Ordered shot list, owned by the orchestrator during production
    pub shots: Vec<Shot>,

    /// Index of the shot currently (or next) in production
    #[serde(default)]
    pub current_shot_index: usize,

    /// Master anchor; set once before production, immutable for the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_anchor: Option<MasterAnchor>,

    /// Frame-chaining context (seed lock + previous end frame)
    #[serde(default)]
    pub chain_context: ChainContext,

    /// Voice tracks, one per shot with dialogue
    #[serde(default)]
    pub voice_tracks: Vec<VoiceTrack>,

    /// Billing/quality tier for the run
    #[serde(default)]
    pub quality_tier: QualityTier,

    /// Whether the cinematic audit has been approved
    #[serde(default)]
    pub audit_approved: bool,

    /// Corrective criteria from the recorded audit, forwarded to the visual
    /// debugger on every attempt
    #[serde(default)]
    pub audit_corrective_prompts: Vec<String>,

    /// Re-entrancy guard: true while a run loop is driving shots
    #[serde(default)]
    pub running: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ProductionState {
    /// Create a new run for a project from its approved shot list.
    pub fn new(project_id: ProjectId, shots: Vec<Shot>, quality_tier: QualityTier) -> Self {
        let now = Utc::now();
        Self {
            project_id,
            shots,
            current_shot_index: 0,
            master_anchor: None,
            chain_context: ChainContext::default(),
            voice_tracks: Vec::new(),
            quality_tier,
            audit_approved: false,
            audit_corrective_prompts: Vec::new(),
            running: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the master anchor. Set once; later calls are ignored so the
    /// anchor stays immutable for the run.
    pub fn set_master_anchor(&mut self, anchor: MasterAnchor) {
        if self.master_anchor.is_none() {
            self.master_anchor = Some(anchor);
            self.touch();
        }
    }

    /// Whether reference analysis has completed for this run.
    pub fn analysis_complete(&self) -> bool {
        self.master_anchor.is_some()
    }

    /// Record the latest audit run's corrective criteria. Approval stays a
    /// separate user decision.
    pub fn record_audit_criteria(&mut self, corrective_prompts: Vec<String>) {
        self.audit_corrective_prompts = corrective_prompts;
        self.touch();
    }

    /// Look up a shot by id.
    pub fn shot(&self, shot_id: &ShotId) -> Option<&Shot> {
        self.shots.iter().find(|s| &s.id == shot_id)
    }

    /// Look up a shot mutably by id.
    pub fn shot_mut(&mut self, shot_id: &ShotId) -> Option<&mut Shot> {
        self.shots.iter_mut().find(|s| &s.id == shot_id)
    }

    /// The shot currently pointed at by `current_shot_index`, if any.
    pub fn current_shot(&self) -> Option<&Shot> {
        self.shots.get(self.current_shot_index)
    }

    /// Voice track for a shot, if one was generated.
    pub fn voice_track(&self, shot_id: &ShotId) -> Option<&VoiceTrack> {
        self.voice_tracks.iter().find(|t| &t.shot_id == shot_id)
    }

    /// Record a completed voice track, replacing any earlier attempt.
    pub fn set_voice_track(&mut self, track: VoiceTrack) {
        self.voice_tracks.retain(|t| t.shot_id != track.shot_id);
        self.voice_tracks.push(track);
        self.touch();
    }

    /// Whether every shot has reached a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.shots.iter().all(|s| s.status.is_terminal())
    }

    /// Whether every shot completed successfully.
    pub fn all_completed(&self) -> bool {
        self.shots.iter().all(|s| s.status == ShotStatus::Completed)
    }

    /// Indices of failed shots, in original order.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.shots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status == ShotStatus::Failed)
            .map(|(i, _)| i)
            .collect()
    }

    /// Startup reconciliation: a shot persisted as `generating` means the
    /// process died mid-call, and the outcome of that external call is
    /// unknown. Map it back to `pending` and clear the run flag; resuming
    /// requires an explicit start.
    ///
    /// Returns the number of shots reconciled.
    pub fn reconcile(&mut self) -> usize {
        let mut reconciled = 0;
        for shot in &mut self.shots {
            if shot.status == ShotStatus::Generating {
                shot.revert_to_pending();
                reconciled += 1;
            }
        }
        self.running = false;
        if reconciled > 0 {
            self.touch();
        }
        reconciled
    }

    /// Bump the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
