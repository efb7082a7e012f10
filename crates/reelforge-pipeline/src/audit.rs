//! Cinematic audit: pre-production critique and the approval gate.
//!
//! The critique service runs once per explicit "run audit" action, never
//! automatically on shot edits. Two user actions act on the result:
//! applying a suggestion mutates the targeted shot's description/dialogue,
//! and approving flips the production gate. Approval is monotonic — later
//! edits do not revoke it.

use std::sync::Arc;

use tracing::info;

use reelforge_gen_client::{CritiqueRequest, GenerationService};
use reelforge_models::{AuditResult, MasterAnchor, ProductionState, Shot, ShotId};

use crate::error::{PipelineError, PipelineResult};

/// Critiques the shot list before any billable generation happens.
pub struct CinematicAuditor {
    service: Arc<dyn GenerationService>,
}

impl CinematicAuditor {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }

    /// Run one audit over the full shot list.
    pub async fn run_audit(
        &self,
        shots: &[Shot],
        anchor: &MasterAnchor,
    ) -> PipelineResult<AuditResult> {
        if shots.is_empty() {
            return Err(PipelineError::audit("no shots to audit"));
        }

        let response = self
            .service
            .critique(&CritiqueRequest {
                shots: shots.to_vec(),
                character_bible: anchor.character_bible.clone(),
            })
            .await
            .map_err(|e| PipelineError::audit(e.to_string()))?;

        let audit = AuditResult::new(
            response.score,
            response.passed,
            response.per_shot_suggestions,
            response.corrective_prompts,
        );

        info!(
            score = audit.score,
            passed = audit.passed,
            suggestions = audit.per_shot_suggestions.len(),
            "Audit completed"
        );

        Ok(audit)
    }

    /// Apply the audit's suggestion for one shot, overwriting its
    /// description/dialogue with the suggested text. Does not re-run the
    /// audit or re-validate the shot.
    ///
    /// Rejected once production has started: shots are orchestrator-owned
    /// from the first `start()` on.
    pub fn apply_suggestion(
        &self,
        state: &mut ProductionState,
        audit: &AuditResult,
        shot_id: &ShotId,
    ) -> PipelineResult<()> {
        if state.running || state.chain_context.seed.is_some() {
            return Err(PipelineError::precondition(
                "cannot edit shots after production has started",
            ));
        }

        let suggestion = audit
            .suggestion_for(shot_id)
            .ok_or_else(|| PipelineError::audit(format!("no suggestion for shot {}", shot_id)))?
            .clone();

        let shot = state
            .shot_mut(shot_id)
            .ok_or_else(|| PipelineError::audit(format!("unknown shot {}", shot_id)))?;

        if let Some(description) = suggestion.suggested_description {
            shot.description = description;
        }
        if let Some(dialogue) = suggestion.suggested_dialogue {
            shot.dialogue = dialogue;
        }
        state.touch();

        info!(shot_id = %shot_id, "Applied audit suggestion");
        Ok(())
    }

    /// Record the audit's corrective criteria on the run and flip approval.
    ///
    /// Idempotent, and monotonic by design: editing shots afterwards does
    /// not revoke approval. A passing score never approves by itself — this
    /// is always an explicit user action.
    pub fn approve_audit(&self, state: &mut ProductionState, audit: &AuditResult) {
        state.record_audit_criteria(audit.corrective_prompts.clone());
        if !state.audit_approved {
            state.audit_approved = true;
            state.touch();
            info!(project_id = %state.project_id, "Audit approved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelforge_gen_client::{
        CritiqueResponse, DebugRequest, DebugResponse, ExportRequest, ExportResponse, GenError,
        GenResult, ScriptRequest, ScriptResponse, VideoGenRequest, VideoGenResponse,
        VisionRequest, VisionResponse, VoiceRequest, VoiceResponse,
    };
    use reelforge_models::{CharacterBible, ProjectId, QualityTier, ShotSuggestion};

    struct FixedCritique(CritiqueResponse);

    #[async_trait]
    impl GenerationService for FixedCritique {
        async fn generate_script(&self, _request: &ScriptRequest) -> GenResult<ScriptResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
        }
        async fn analyze_reference(&self, _request: &VisionRequest) -> GenResult<VisionResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
        }
        async fn critique(&self, _request: &CritiqueRequest) -> GenResult<CritiqueResponse> {
            Ok(self.0.clone())
        }
        async fn generate_video(&self, _request: &VideoGenRequest) -> GenResult<VideoGenResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
        }
        async fn generate_voice(&self, _request: &VoiceRequest) -> GenResult<VoiceResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
        }
        async fn score_visual(&self, _request: &DebugRequest) -> GenResult<DebugResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
        }
        async fn export(&self, _request: &ExportRequest) -> GenResult<ExportResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
        }
    }

    fn anchor() -> MasterAnchor {
        MasterAnchor::new(
            "https://cdn.example.com/ref.png",
            CharacterBible::from_partial("Mara", None, None, None, None, None, None, vec![]),
        )
    }

    fn state_with_shots() -> ProductionState {
        ProductionState::new(
            ProjectId::new(),
            vec![
                Shot::new(0, "Opening", "A drowned city at dawn"),
                Shot::new(1, "The Run", "The courier sprints across a rooftop"),
            ],
            QualityTier::Standard,
        )
    }

    fn auditor_with(response: CritiqueResponse) -> CinematicAuditor {
        CinematicAuditor::new(Arc::new(FixedCritique(response)))
    }

    fn sample_audit() -> AuditResult {
        AuditResult::new(
            0.6,
            false,
            vec![ShotSuggestion {
                shot_id: ShotId::from_index(1),
                suggested_description: Some("Tighter framing on the courier".into()),
                suggested_dialogue: Some("Almost there.".into()),
                note: "subject lost in wide frame".into(),
            }],
            vec!["keep the red jacket visible".into()],
        )
    }

    #[tokio::test]
    async fn test_run_audit_maps_response() {
        let auditor = auditor_with(CritiqueResponse {
            score: 0.82,
            passed: true,
            per_shot_suggestions: vec![],
            corrective_prompts: vec!["hold continuity on lighting".into()],
        });
        let state = state_with_shots();

        let audit = auditor.run_audit(&state.shots, &anchor()).await.unwrap();
        assert!(audit.passed);
        assert_eq!(audit.corrective_prompts.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_shot_list_rejected() {
        let auditor = auditor_with(CritiqueResponse {
            score: 0.0,
            passed: false,
            per_shot_suggestions: vec![],
            corrective_prompts: vec![],
        });
        let err = auditor.run_audit(&[], &anchor()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Audit(_)));
    }

    #[test]
    fn test_apply_suggestion_mutates_target_shot() {
        let auditor = auditor_with(CritiqueResponse {
            score: 0.0,
            passed: false,
            per_shot_suggestions: vec![],
            corrective_prompts: vec![],
        });
        let mut state = state_with_shots();
        let audit = sample_audit();

        auditor
            .apply_suggestion(&mut state, &audit, &ShotId::from_index(1))
            .unwrap();

        let shot = state.shot(&ShotId::from_index(1)).unwrap();
        assert_eq!(shot.description, "Tighter framing on the courier");
        assert_eq!(shot.dialogue, "Almost there.");
        // The untouched shot keeps its text.
        assert_eq!(
            state.shot(&ShotId::from_index(0)).unwrap().description,
            "A drowned city at dawn"
        );
    }

    #[test]
    fn test_apply_suggestion_rejected_after_production_start() {
        let auditor = auditor_with(CritiqueResponse {
            score: 0.0,
            passed: false,
            per_shot_suggestions: vec![],
            corrective_prompts: vec![],
        });
        let mut state = state_with_shots();
        state.chain_context.lock_seed(7);

        let err = auditor
            .apply_suggestion(&mut state, &sample_audit(), &ShotId::from_index(1))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }

    #[test]
    fn test_approve_audit_is_idempotent_and_monotonic() {
        let auditor = auditor_with(CritiqueResponse {
            score: 0.0,
            passed: false,
            per_shot_suggestions: vec![],
            corrective_prompts: vec![],
        });
        let mut state = state_with_shots();
        let audit = sample_audit();

        auditor.approve_audit(&mut state, &audit);
        assert!(state.audit_approved);
        assert_eq!(state.audit_corrective_prompts, audit.corrective_prompts);

        let after_first = state.audit_approved;
        auditor.approve_audit(&mut state, &audit);
        assert_eq!(state.audit_approved, after_first);

        // Editing a shot afterwards does not revoke approval.
        state.shot_mut(&ShotId::from_index(0)).unwrap().description = "Edited".into();
        assert!(state.audit_approved);
    }
}
