//! Shot definitions and the per-shot generation state machine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a shot, sequence-ordered (`S01`, `S02`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ShotId(pub String);

impl ShotId {
    /// Build the canonical id for a 0-based shot index (`0` -> `S01`).
    pub fn from_index(index: u32) -> Self {
        Self(format!("S{:02}", index + 1))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shot state in the production pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShotStatus {
    /// Shot is waiting to be generated
    #[default]
    Pending,
    /// Shot is being generated (at most one shot pipeline-wide)
    Generating,
    /// Shot generated and accepted by the quality gate
    Completed,
    /// Shot failed after exhausting the retry budget
    Failed,
}

impl ShotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotStatus::Pending => "pending",
            ShotStatus::Generating => "generating",
            ShotStatus::Completed => "completed",
            ShotStatus::Failed => "failed",
        }
    }

    /// `completed` is absorbing; `failed` is only re-enterable via the
    /// explicit retry action.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShotStatus::Completed | ShotStatus::Failed)
    }
}

impl fmt::Display for ShotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One quality-gate verdict, recorded per generation attempt.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VisualDebugResult {
    /// Score assigned by the visual debugger (0.0 - 1.0)
    pub score: f32,
    /// Whether the attempt passed the quality gate
    pub passed: bool,
    /// Corrective prompt to append on the next attempt (failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrective_prompt: Option<String>,
}

/// One planned clip in the production.
///
/// Shots are created once by the breakdown engine with immutable `id` and
/// `index`. Only `description` and `dialogue` are user-editable before
/// approval; every other field is orchestrator-owned once production starts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Shot {
    /// Stable, unique, sequence-ordered id
    pub id: ShotId,

    /// Position in the shot list (0-based)
    pub index: u32,

    /// Short human-readable title
    pub title: String,

    /// Visual description used as the generation prompt
    pub description: String,

    /// Spoken dialogue (empty when the shot has none)
    #[serde(default)]
    pub dialogue: String,

    /// Mood keyword steering the generation
    #[serde(default = "default_mood")]
    pub mood: String,

    /// Transition out of this shot (e.g. "cut", "dissolve")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_out: Option<String>,

    /// Planned clip duration in seconds
    pub duration_seconds: f64,

    /// Generation state
    #[serde(default)]
    pub status: ShotStatus,

    /// Generated clip URL (set only on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Final frame of the generated clip, used to chain the next shot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_frame_url: Option<String>,

    /// Number of corrective retries consumed
    #[serde(default)]
    pub retry_count: u32,

    /// Quality-gate verdicts, one per generation attempt (append-only)
    #[serde(default)]
    pub visual_debug_results: Vec<VisualDebugResult>,

    /// Error message (set only on terminal failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_mood() -> String {
    "neutral".to_string()
}

impl Shot {
    /// Create a new pending shot at the given index.
    pub fn new(index: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ShotId::from_index(index),
            index,
            title: title.into(),
            description: description.into(),
            dialogue: String::new(),
            mood: default_mood(),
            transition_out: None,
            duration_seconds: 5.0,
            status: ShotStatus::Pending,
            video_url: None,
            end_frame_url: None,
            retry_count: 0,
            visual_debug_results: Vec::new(),
            error: None,
        }
    }

    /// Set the dialogue line.
    pub fn with_dialogue(mut self, dialogue: impl Into<String>) -> Self {
        self.dialogue = dialogue.into();
        self
    }

    /// Set the mood keyword.
    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = mood.into();
        self
    }

    /// Set the planned duration.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Set the outgoing transition.
    pub fn with_transition(mut self, transition: impl Into<String>) -> Self {
        self.transition_out = Some(transition.into());
        self
    }

    /// Whether this shot speaks (drives voice generation).
    pub fn has_dialogue(&self) -> bool {
        !self.dialogue.trim().is_empty()
    }

    /// Transition to `generating`.
    pub fn begin_generating(&mut self) {
        self.status = ShotStatus::Generating;
        self.error = None;
    }

    /// Record a successful generation and accept the shot.
    pub fn complete(&mut self, video_url: impl Into<String>, end_frame_url: impl Into<String>) {
        self.status = ShotStatus::Completed;
        self.video_url = Some(video_url.into());
        self.end_frame_url = Some(end_frame_url.into());
        self.error = None;
    }

    /// Record a terminal failure after the retry budget is exhausted.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ShotStatus::Failed;
        self.error = Some(error.into());
    }

    /// Revert an in-flight shot to `pending` (cancellation path — not an
    /// error, so any recorded error stays cleared).
    pub fn revert_to_pending(&mut self) {
        self.status = ShotStatus::Pending;
        self.error = None;
    }

    /// Reset a failed shot for a manual retry cycle. The accumulated
    /// `visual_debug_results` history is retained; the attempt budget is
    /// fresh.
    pub fn reset_for_retry(&mut self) {
        self.status = ShotStatus::Pending;
        self.retry_count = 0;
        self.error = None;
    }

    /// Append a quality-gate verdict for the latest attempt.
    pub fn record_debug_result(&mut self, result: VisualDebugResult) {
        self.visual_debug_results.push(result);
    }
}
