//! Pipeline configuration.

use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum generation attempts per shot (initial attempt + corrective
    /// retries)
    pub max_shot_attempts: u32,
    /// Default shot duration when the breakdown omits one (seconds)
    pub default_shot_duration: f64,
    /// Default mood keyword when the breakdown omits one
    pub default_mood: String,
    /// Voice id used for dialogue tracks
    pub voice_id: String,
    /// Per-shot generation timeout
    pub shot_timeout: Duration,
    /// Progress channel buffer size
    pub progress_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_shot_attempts: 3,
            default_shot_duration: 5.0,
            default_mood: "neutral".to_string(),
            voice_id: "narrator".to_string(),
            shot_timeout: Duration::from_secs(900), // 15 minutes
            progress_buffer: 256,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_shot_attempts: std::env::var("PIPELINE_MAX_SHOT_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            default_shot_duration: std::env::var("PIPELINE_DEFAULT_SHOT_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5.0),
            default_mood: std::env::var("PIPELINE_DEFAULT_MOOD")
                .unwrap_or_else(|_| "neutral".to_string()),
            voice_id: std::env::var("PIPELINE_VOICE_ID")
                .unwrap_or_else(|_| "narrator".to_string()),
            shot_timeout: Duration::from_secs(
                std::env::var("PIPELINE_SHOT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            progress_buffer: std::env::var("PIPELINE_PROGRESS_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
        }
    }
}
