//! The generation service trait — the seam every pipeline component calls
//! through.

use async_trait::async_trait;

use crate::error::GenResult;
use crate::types::{
    CritiqueRequest, CritiqueResponse, DebugRequest, DebugResponse, ExportRequest,
    ExportResponse, ScriptRequest, ScriptResponse, VideoGenRequest, VideoGenResponse,
    VisionRequest, VisionResponse, VoiceRequest, VoiceResponse,
};

/// External generation operations consumed by the pipeline.
///
/// Implementations must be safe to call from the orchestrator's
/// `tokio::select!` cancellation points: dropping the returned future must
/// abort the underlying request.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate raw narrative text for a synopsis.
    async fn generate_script(&self, request: &ScriptRequest) -> GenResult<ScriptResponse>;

    /// Analyze a reference image into character-bible fields.
    async fn analyze_reference(&self, request: &VisionRequest) -> GenResult<VisionResponse>;

    /// Critique a shot list before production.
    async fn critique(&self, request: &CritiqueRequest) -> GenResult<CritiqueResponse>;

    /// Generate one video clip attempt.
    async fn generate_video(&self, request: &VideoGenRequest) -> GenResult<VideoGenResponse>;

    /// Generate a voice track for a dialogue line.
    async fn generate_voice(&self, request: &VoiceRequest) -> GenResult<VoiceResponse>;

    /// Score a generated clip against the character bible.
    async fn score_visual(&self, request: &DebugRequest) -> GenResult<DebugResponse>;

    /// Render the final artifact from ordered clips.
    async fn export(&self, request: &ExportRequest) -> GenResult<ExportResponse>;
}
