//! Reference anchor analysis: reference image → character bible.

use std::sync::Arc;

use tracing::info;

use reelforge_gen_client::{GenerationService, VisionRequest};
use reelforge_models::{CharacterBible, MasterAnchor};

use crate::error::{PipelineError, PipelineResult};

/// Extracts a reusable character bible from a reference image.
///
/// The returned anchor is complete by construction: any field the vision
/// service omits is synthesized from the subject name, so production can
/// always start once this call succeeds.
pub struct ReferenceAnchorAnalyzer {
    service: Arc<dyn GenerationService>,
}

impl ReferenceAnchorAnalyzer {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }

    /// Analyze a reference image into a master anchor.
    pub async fn analyze(
        &self,
        image_url: &str,
        subject_name: &str,
    ) -> PipelineResult<MasterAnchor> {
        if image_url.trim().is_empty() {
            return Err(PipelineError::precondition("reference image URL is empty"));
        }
        if subject_name.trim().is_empty() {
            return Err(PipelineError::precondition("subject name is empty"));
        }

        let response = self
            .service
            .analyze_reference(&VisionRequest {
                image_url: image_url.to_string(),
                subject_name: subject_name.to_string(),
            })
            .await
            .map_err(|e| PipelineError::reference_analysis(e.to_string()))?;

        let bible = CharacterBible::from_partial(
            subject_name,
            response.front_view,
            response.side_view,
            response.back_view,
            response.hair,
            response.clothing,
            response.distinguishing_features,
            response.negative_prompts,
        );

        info!(
            subject = subject_name,
            negatives = bible.negative_prompts.len(),
            "Built character bible from reference image"
        );

        Ok(MasterAnchor::new(image_url, bible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelforge_gen_client::{
        CritiqueRequest, CritiqueResponse, DebugRequest, DebugResponse, ExportRequest,
        ExportResponse, GenError, GenResult, ScriptRequest, ScriptResponse, VideoGenRequest,
        VideoGenResponse, VisionResponse, VoiceRequest, VoiceResponse,
    };

    struct FixedVision(VisionResponse);

    #[async_trait]
    impl GenerationService for FixedVision {
        async fn generate_script(&self, _request: &ScriptRequest) -> GenResult<ScriptResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
        }
        async fn analyze_reference(&self, _request: &VisionRequest) -> GenResult<VisionResponse> {
            Ok(self.0.clone())
        }
        async fn critique(&self, _request: &CritiqueRequest) -> GenResult<CritiqueResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
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

    #[tokio::test]
    async fn test_partial_vision_response_is_completed() {
        let analyzer = ReferenceAnchorAnalyzer::new(Arc::new(FixedVision(VisionResponse {
            front_view: Some("Mara, mid-30s, sharp jawline".into()),
            hair: Some("short black hair".into()),
            ..VisionResponse::default()
        })));

        let anchor = analyzer
            .analyze("https://cdn.example.com/ref.png", "Mara")
            .await
            .unwrap();

        assert_eq!(anchor.image_url, "https://cdn.example.com/ref.png");
        assert_eq!(anchor.character_bible.hair, "short black hair");
        assert!(anchor.character_bible.side_view.contains("Mara"));
        assert!(!anchor.character_bible.negative_prompts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_image_url_rejected() {
        let analyzer = ReferenceAnchorAnalyzer::new(Arc::new(FixedVision(VisionResponse::default())));
        let err = analyzer.analyze("  ", "Mara").await.unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }
}
