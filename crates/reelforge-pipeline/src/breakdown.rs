//! Script breakdown: synopsis → ordered shot list.
//!
//! Calls the script generation service for raw narrative text, then parses
//! it into shots. The prompt demands a strict JSON scene array; a plain-text
//! `Scene N:` fallback parser covers models that ignore the format
//! instruction. Malformed scenes are repaired with policy defaults rather
//! than rejected — only an empty or fully unparseable script aborts the
//! breakdown.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use reelforge_gen_client::{GenerationService, ScriptRequest};
use reelforge_models::{BreakdownRequest, Shot};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Result of a successful breakdown.
#[derive(Debug, Clone)]
pub struct BreakdownOutcome {
    /// Raw narrative text as returned by the service
    pub raw_script: String,
    /// Parsed, ordered shot list
    pub shots: Vec<Shot>,
}

/// Turns a synopsis into an ordered shot list.
pub struct ScriptBreakdownEngine {
    service: Arc<dyn GenerationService>,
    config: PipelineConfig,
}

/// One scene as parsed from the raw script, before repair.
#[derive(Debug, Default, Deserialize)]
struct SceneDraft {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    dialogue: Option<String>,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    transition: Option<String>,
    #[serde(default)]
    duration_seconds: Option<f64>,
}

/// Wrapper shape some models emit instead of a bare array.
#[derive(Debug, Deserialize)]
struct SceneList {
    scenes: Vec<SceneDraft>,
}

impl ScriptBreakdownEngine {
    pub fn new(service: Arc<dyn GenerationService>, config: PipelineConfig) -> Self {
        Self { service, config }
    }

    /// Break a synopsis down into shots.
    ///
    /// Fatal on transport errors and on empty/unparseable scripts — no
    /// partial shot list is ever returned.
    pub async fn breakdown(&self, request: &BreakdownRequest) -> PipelineResult<BreakdownOutcome> {
        request
            .validate()
            .map_err(|e| PipelineError::precondition(format!("invalid breakdown request: {}", e)))?;

        let prompt = self.build_prompt(request);
        let response = self
            .service
            .generate_script(&ScriptRequest {
                title: request.title.clone(),
                genre: request.genre.clone(),
                synopsis: request.synopsis.clone(),
                target_duration_seconds: request.target_duration_seconds,
                prompt,
            })
            .await
            .map_err(|e| PipelineError::script_generation(e.to_string()))?;

        let raw_script = response.raw_script;
        if raw_script.trim().is_empty() {
            return Err(PipelineError::script_generation("service returned an empty script"));
        }

        let drafts = match parse_json_scenes(&raw_script) {
            Some(drafts) => drafts,
            None => {
                warn!("Script is not valid JSON, falling back to text parsing");
                parse_text_scenes(&raw_script)
            }
        };

        let mut shots = self.drafts_to_shots(drafts);
        if shots.is_empty() {
            return Err(PipelineError::script_generation(
                "no usable scenes could be parsed from the script",
            ));
        }

        scale_durations(&mut shots, request.target_duration_seconds);

        info!(
            shots = shots.len(),
            total_duration = shots.iter().map(|s| s.duration_seconds).sum::<f64>(),
            "Parsed shot list from script"
        );

        Ok(BreakdownOutcome { raw_script, shots })
    }

    /// Build the prompt sent to the script model.
    fn build_prompt(&self, request: &BreakdownRequest) -> String {
        format!(
            r#"You are a film director breaking a story down into shots for AI video generation.

Title: {title}
Genre: {genre}
Target duration: {target} seconds

SYNOPSIS:
{synopsis}

IMPORTANT: You must strictly follow this output format.
Return ONLY a single JSON array with this schema:
[
  {{
    "title": "Shot title",
    "description": "Visual description of the shot, concrete and filmable",
    "dialogue": "Spoken line, or empty string",
    "mood": "one mood keyword",
    "transition": "cut | dissolve | fade",
    "duration_seconds": 5.0
  }}
]

Additional instructions:
- Return ONLY the JSON array and nothing else.
- Break the story into 4 to 12 shots.
- Shot durations should sum to roughly {target} seconds.
- Every description must stand alone; never reference other shots.
"#,
            title = request.title,
            genre = request.genre,
            target = request.target_duration_seconds,
            synopsis = request.synopsis,
        )
    }

    /// Repair drafts into shots, applying policy defaults. A draft with no
    /// description and no title is dropped; everything else is kept.
    fn drafts_to_shots(&self, drafts: Vec<SceneDraft>) -> Vec<Shot> {
        let mut shots = Vec::new();

        for draft in drafts {
            let description = draft
                .description
                .filter(|d| !d.trim().is_empty())
                .or_else(|| draft.title.clone().filter(|t| !t.trim().is_empty()));

            let Some(description) = description else {
                warn!("Dropping scene with no description or title");
                continue;
            };

            let index = shots.len() as u32;
            let title = draft
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("Shot {}", index + 1));

            let duration = draft
                .duration_seconds
                .filter(|d| *d > 0.0)
                .unwrap_or(self.config.default_shot_duration);

            let mood = draft
                .mood
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.config.default_mood.clone());

            let mut shot = Shot::new(index, title, description)
                .with_duration(duration)
                .with_mood(mood);
            if let Some(dialogue) = draft.dialogue.filter(|d| !d.trim().is_empty()) {
                shot = shot.with_dialogue(dialogue);
            }
            if let Some(transition) = draft.transition.filter(|t| !t.trim().is_empty()) {
                shot = shot.with_transition(transition);
            }
            shots.push(shot);
        }

        shots
    }
}

/// Strip markdown code fences the model may wrap the JSON in.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Try to parse the script as a JSON scene array (bare or wrapped).
fn parse_json_scenes(raw: &str) -> Option<Vec<SceneDraft>> {
    let text = strip_code_fences(raw);

    if let Ok(drafts) = serde_json::from_str::<Vec<SceneDraft>>(text) {
        return Some(drafts);
    }
    if let Ok(list) = serde_json::from_str::<SceneList>(text) {
        return Some(list.scenes);
    }
    None
}

/// Fallback parser for `Scene N:`-delimited plain text.
///
/// Recognizes `Description:`, `Dialogue:`, `Mood:`, `Transition:` and
/// `Duration:` keys inside each block; the scene heading's remainder becomes
/// the title.
fn parse_text_scenes(raw: &str) -> Vec<SceneDraft> {
    let mut drafts: Vec<SceneDraft> = Vec::new();
    let mut current: Option<SceneDraft> = None;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = scene_heading(trimmed) {
            if let Some(draft) = current.take() {
                drafts.push(draft);
            }
            current = Some(SceneDraft {
                title: (!rest.is_empty()).then(|| rest.to_string()),
                ..SceneDraft::default()
            });
            continue;
        }

        let Some(draft) = current.as_mut() else {
            continue;
        };

        if let Some(value) = key_value(trimmed, "description") {
            draft.description = Some(value);
        } else if let Some(value) = key_value(trimmed, "dialogue") {
            draft.dialogue = Some(value);
        } else if let Some(value) = key_value(trimmed, "mood") {
            draft.mood = Some(value);
        } else if let Some(value) = key_value(trimmed, "transition") {
            draft.transition = Some(value);
        } else if let Some(value) = key_value(trimmed, "duration") {
            draft.duration_seconds = value
                .trim_end_matches(|c: char| c.is_alphabetic())
                .trim()
                .parse()
                .ok();
        } else if draft.description.is_none() {
            // Untagged prose under a scene heading is its description.
            draft.description = Some(trimmed.to_string());
        }
    }

    if let Some(draft) = current.take() {
        drafts.push(draft);
    }
    drafts
}

/// Match a `Scene N` / `SCENE N:` heading; returns the remainder after the
/// scene number.
fn scene_heading(line: &str) -> Option<&str> {
    let lower = line.to_lowercase();
    if !lower.starts_with("scene") {
        return None;
    }
    let rest = line[5..].trim_start();
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    Some(rest[digits..].trim_start_matches([':', '.', '-']).trim())
}

/// Match a `Key: value` line, case-insensitive on the key.
fn key_value(line: &str, key: &str) -> Option<String> {
    let (head, tail) = line.split_once(':')?;
    if head.trim().to_lowercase() == key {
        let value = tail.trim();
        (!value.is_empty()).then(|| value.to_string())
    } else {
        None
    }
}

/// Uniformly scale durations so the sum approximates the target.
fn scale_durations(shots: &mut [Shot], target_seconds: f64) {
    let sum: f64 = shots.iter().map(|s| s.duration_seconds).sum();
    if sum <= 0.0 || target_seconds <= 0.0 {
        return;
    }
    let factor = target_seconds / sum;
    for shot in shots {
        shot.duration_seconds = (shot.duration_seconds * factor).max(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelforge_gen_client::{
        CritiqueRequest, CritiqueResponse, DebugRequest, DebugResponse, ExportRequest,
        ExportResponse, GenError, GenResult, ScriptResponse, VideoGenRequest, VideoGenResponse,
        VisionRequest, VisionResponse, VoiceRequest, VoiceResponse,
    };

    /// Service stub that returns a fixed script and rejects everything else.
    struct FixedScript(String);

    #[async_trait]
    impl GenerationService for FixedScript {
        async fn generate_script(&self, _request: &ScriptRequest) -> GenResult<ScriptResponse> {
            Ok(ScriptResponse {
                raw_script: self.0.clone(),
            })
        }
        async fn analyze_reference(&self, _request: &VisionRequest) -> GenResult<VisionResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
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

    fn engine(script: &str) -> ScriptBreakdownEngine {
        ScriptBreakdownEngine::new(
            Arc::new(FixedScript(script.to_string())),
            PipelineConfig::default(),
        )
    }

    fn request() -> BreakdownRequest {
        BreakdownRequest {
            title: "The Last Courier".into(),
            genre: "thriller".into(),
            synopsis: "A courier carries the last message across a drowned city.".into(),
            target_duration_seconds: 30.0,
        }
    }

    #[tokio::test]
    async fn test_json_breakdown_with_fences() {
        let script = r#"```json
[
  {"title": "Opening", "description": "A drowned city at dawn", "dialogue": "", "mood": "somber", "duration_seconds": 10.0},
  {"title": "The Run", "description": "The courier sprints across a rooftop", "dialogue": "Almost there.", "mood": "tense", "duration_seconds": 20.0}
]
```"#;
        let outcome = engine(script).breakdown(&request()).await.unwrap();

        assert_eq!(outcome.shots.len(), 2);
        assert_eq!(outcome.shots[0].id.as_str(), "S01");
        assert_eq!(outcome.shots[1].id.as_str(), "S02");
        assert_eq!(outcome.shots[0].mood, "somber");
        assert!(outcome.shots[1].has_dialogue());
        assert_eq!(outcome.raw_script, script);
    }

    #[tokio::test]
    async fn test_malformed_scene_is_repaired_not_rejected() {
        // Second scene misses duration and mood, third has nothing usable.
        let script = r#"[
  {"description": "A drowned city at dawn", "duration_seconds": 10.0},
  {"title": "The Run"},
  {"dialogue": "dropped"}
]"#;
        let outcome = engine(script).breakdown(&request()).await.unwrap();

        assert_eq!(outcome.shots.len(), 2);
        assert_eq!(outcome.shots[0].title, "Shot 1");
        // Title stands in for the missing description.
        assert_eq!(outcome.shots[1].description, "The Run");
        assert_eq!(outcome.shots[1].mood, "neutral");
        assert!(outcome.shots[1].duration_seconds > 0.0);
    }

    #[tokio::test]
    async fn test_text_fallback_parsing() {
        let script = "Scene 1: Opening\nDescription: A drowned city at dawn\nMood: somber\nDuration: 10s\n\nScene 2: The Run\nDescription: The courier sprints across a rooftop\nDialogue: Almost there.\nDuration: 20s\n";
        let outcome = engine(script).breakdown(&request()).await.unwrap();

        assert_eq!(outcome.shots.len(), 2);
        assert_eq!(outcome.shots[0].title, "Opening");
        assert_eq!(outcome.shots[0].mood, "somber");
        assert_eq!(outcome.shots[1].dialogue, "Almost there.");
    }

    #[tokio::test]
    async fn test_durations_scale_toward_target() {
        let script = r#"[
  {"description": "one", "duration_seconds": 10.0},
  {"description": "two", "duration_seconds": 10.0}
]"#;
        let outcome = engine(script).breakdown(&request()).await.unwrap();

        let total: f64 = outcome.shots.iter().map(|s| s.duration_seconds).sum();
        assert!((total - 30.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_script_is_fatal() {
        let err = engine("   ").breakdown(&request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ScriptGeneration(_)));
    }

    #[tokio::test]
    async fn test_unparseable_script_is_fatal() {
        let err = engine("nothing here resembles scenes")
            .breakdown(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ScriptGeneration(_)));
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_service_call() {
        let mut bad = request();
        bad.target_duration_seconds = 0.0;
        let err = engine("[]").breakdown(&bad).await.unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }
}
