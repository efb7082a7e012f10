//! Cinematic audit results.
//!
//! The audit is a pre-production critique pass over the full shot list. It
//! runs once per explicit user action, and approval is always a separate
//! user decision — a passing score never approves production by itself.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ShotId;

/// A corrective suggestion targeting one shot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShotSuggestion {
    /// Shot the suggestion applies to
    pub shot_id: ShotId,
    /// Replacement description, when the critique proposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_description: Option<String>,
    /// Replacement dialogue, when the critique proposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_dialogue: Option<String>,
    /// Critique note explaining the suggestion
    pub note: String,
}

/// Result of one audit run over the shot list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuditResult {
    /// Overall critique score (0.0 - 1.0)
    pub score: f32,
    /// Whether the critique considers the list production-ready
    pub passed: bool,
    /// Per-shot corrective suggestions
    #[serde(default)]
    pub per_shot_suggestions: Vec<ShotSuggestion>,
    /// Corrective criteria forwarded to the visual debugger during production
    #[serde(default)]
    pub corrective_prompts: Vec<String>,
    /// When the audit ran
    pub created_at: DateTime<Utc>,
}

impl AuditResult {
    pub fn new(
        score: f32,
        passed: bool,
        per_shot_suggestions: Vec<ShotSuggestion>,
        corrective_prompts: Vec<String>,
    ) -> Self {
        Self {
            score,
            passed,
            per_shot_suggestions,
            corrective_prompts,
            created_at: Utc::now(),
        }
    }

    /// Find the suggestion for a shot, if the critique produced one.
    pub fn suggestion_for(&self, shot_id: &ShotId) -> Option<&ShotSuggestion> {
        self.per_shot_suggestions.iter().find(|s| &s.shot_id == shot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_lookup() {
        let audit = AuditResult::new(
            0.7,
            false,
            vec![ShotSuggestion {
                shot_id: ShotId::from_index(1),
                suggested_description: Some("Tighter framing on the courier".into()),
                suggested_dialogue: None,
                note: "Shot 2 loses the subject in a wide frame".into(),
            }],
            vec!["keep the red jacket visible".into()],
        );

        assert!(audit.suggestion_for(&ShotId::from_index(1)).is_some());
        assert!(audit.suggestion_for(&ShotId::from_index(0)).is_none());
    }
}
