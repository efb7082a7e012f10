//! Progress events emitted during a production run.
//!
//! Consumers (UI, logs) subscribe to a run's event stream to render
//! shot-level status and a single halt reason. Individual retries surface
//! only through the growing `visual_debug_results` list on the shot, not as
//! separate error events.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{ShotId, ShotStatus};

/// One progress event in a production run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductionEvent {
    /// Free-form log line
    Log { message: String },
    /// A shot changed status
    ShotStatus { shot_id: ShotId, status: ShotStatus },
    /// The quality gate scored a generation attempt
    AttemptScored {
        shot_id: ShotId,
        attempt: u32,
        score: f32,
        passed: bool,
    },
    /// The run halted with a single user-facing reason
    Halted { reason: String },
    /// The run was cancelled; the in-flight shot reverted to pending
    Cancelled { shot_id: ShotId },
    /// All shots completed
    Done,
}

impl ProductionEvent {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    pub fn shot_status(shot_id: ShotId, status: ShotStatus) -> Self {
        Self::ShotStatus { shot_id, status }
    }

    pub fn attempt_scored(shot_id: ShotId, attempt: u32, score: f32, passed: bool) -> Self {
        Self::AttemptScored {
            shot_id,
            attempt,
            score,
            passed,
        }
    }

    pub fn halted(reason: impl Into<String>) -> Self {
        Self::Halted {
            reason: reason.into(),
        }
    }

    pub fn cancelled(shot_id: ShotId) -> Self {
        Self::Cancelled { shot_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tags() {
        let event = ProductionEvent::shot_status(ShotId::from_index(0), ShotStatus::Generating);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"shot_status\""));
        assert!(json.contains("\"generating\""));
    }
}
