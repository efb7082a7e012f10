//! Request/response types for the generation service boundary.

use serde::{Deserialize, Serialize};

use reelforge_models::{AudioMixMode, CharacterBible, Shot, ShotId, ShotSuggestion};

/// Script generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub title: String,
    pub genre: String,
    pub synopsis: String,
    pub target_duration_seconds: f64,
    /// Full prompt sent to the model, including format instructions
    pub prompt: String,
}

/// Script generation response: raw narrative text, parsed by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptResponse {
    pub raw_script: String,
}

/// Reference vision-analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionRequest {
    pub image_url: String,
    pub subject_name: String,
}

/// Reference vision-analysis response. Fields the service could not
/// determine are omitted; the caller synthesizes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionResponse {
    #[serde(default)]
    pub front_view: Option<String>,
    #[serde(default)]
    pub side_view: Option<String>,
    #[serde(default)]
    pub back_view: Option<String>,
    #[serde(default)]
    pub hair: Option<String>,
    #[serde(default)]
    pub clothing: Option<String>,
    #[serde(default)]
    pub distinguishing_features: Option<String>,
    #[serde(default)]
    pub negative_prompts: Vec<String>,
}

/// Cinematic critique request over the full shot list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueRequest {
    pub shots: Vec<Shot>,
    pub character_bible: CharacterBible,
}

/// Cinematic critique response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueResponse {
    pub score: f32,
    pub passed: bool,
    #[serde(default)]
    pub per_shot_suggestions: Vec<ShotSuggestion>,
    #[serde(default)]
    pub corrective_prompts: Vec<String>,
}

/// Video generation request for one shot attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoGenRequest {
    pub shot_id: ShotId,
    /// Shot prompt, with any corrective prompt from earlier attempts appended
    pub prompt: String,
    /// Master anchor image for shot 0, previous end frame otherwise
    pub reference_frame_url: String,
    /// Run-locked generation seed
    pub seed: u64,
    pub character_bible: CharacterBible,
    pub duration_seconds: f64,
}

/// Video generation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoGenResponse {
    pub video_url: String,
    pub end_frame_url: String,
}

/// Voice generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceRequest {
    pub text: String,
    pub voice_id: String,
}

/// Voice generation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub audio_url: String,
}

/// Visual debugger scoring request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugRequest {
    /// Frame or clip to score
    pub frame_or_clip_url: String,
    pub character_bible: CharacterBible,
    /// Corrective criteria from the approved audit
    #[serde(default)]
    pub corrective_criteria: Vec<String>,
}

/// Visual debugger verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugResponse {
    pub score: f32,
    pub passed: bool,
    #[serde(default)]
    pub corrective_prompt: Option<String>,
}

/// Export request: ordered clips plus the chosen mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub ordered_clip_urls: Vec<String>,
    pub audio_mix_mode: AudioMixMode,
    /// Voice track URLs aligned with the clips (empty entries for silent shots)
    #[serde(default)]
    pub voice_urls: Vec<Option<String>>,
    /// Optional music bed
    #[serde(default)]
    pub music_url: Option<String>,
}

/// Export response: one downloadable artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub artifact_url: String,
}
