//! Review assembly: completed shots → playable sequence or exported
//! artifact.
//!
//! Playback assembly is pure composition — the mix mode only changes which
//! tracks are mixed and at what volume, nothing is re-encoded. Export
//! delegates to the external exporter with the ordered clip URLs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use reelforge_gen_client::{ExportRequest, GenerationService};
use reelforge_models::{AudioMixMode, ProductionState, ShotId, ShotStatus, VoiceStatus};

use crate::error::{PipelineError, PipelineResult};

/// Kind of audio track in an assembled sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioTrackKind {
    Dialogue,
    Music,
}

/// One audio track with its playback volume under the chosen mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrackRef {
    pub kind: AudioTrackKind,
    pub url: String,
    pub volume: f32,
}

/// One clip placed in the review sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub shot_id: ShotId,
    pub video_url: String,
    pub duration_seconds: f64,
    /// Per-shot audio (dialogue), volume already derived from the mix
    #[serde(default)]
    pub audio: Vec<AudioTrackRef>,
}

/// A playable sequence of completed shots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSequence {
    pub entries: Vec<SequenceEntry>,
    /// Sequence-wide music bed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<AudioTrackRef>,
    pub total_duration_seconds: f64,
    pub mix_mode: AudioMixMode,
}

/// Composes completed shots into a reviewable/exportable sequence.
pub struct ReviewAssembler {
    service: Arc<dyn GenerationService>,
}

impl ReviewAssembler {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }

    /// Assemble the completed shots, in order, into a playable sequence.
    pub fn assemble(
        &self,
        state: &ProductionState,
        mix_mode: AudioMixMode,
        music_url: Option<&str>,
    ) -> ReviewSequence {
        let dialogue_volume = mix_mode.dialogue_volume();
        let mut entries = Vec::new();
        let mut total = 0.0;

        for shot in &state.shots {
            if shot.status != ShotStatus::Completed {
                continue;
            }
            let Some(video_url) = shot.video_url.clone() else {
                continue;
            };

            let mut audio = Vec::new();
            if let Some(track) = state.voice_track(&shot.id) {
                if track.status == VoiceStatus::Completed {
                    if let Some(url) = track.audio_url.clone() {
                        audio.push(AudioTrackRef {
                            kind: AudioTrackKind::Dialogue,
                            url,
                            volume: dialogue_volume,
                        });
                    }
                }
            }

            total += shot.duration_seconds;
            entries.push(SequenceEntry {
                shot_id: shot.id.clone(),
                video_url,
                duration_seconds: shot.duration_seconds,
                audio,
            });
        }

        let music = music_url.map(|url| AudioTrackRef {
            kind: AudioTrackKind::Music,
            url: url.to_string(),
            volume: mix_mode.music_volume(),
        });

        ReviewSequence {
            entries,
            music,
            total_duration_seconds: total,
            mix_mode,
        }
    }

    /// Export the completed shots as a single downloadable artifact.
    pub async fn export(
        &self,
        state: &ProductionState,
        mix_mode: AudioMixMode,
        music_url: Option<&str>,
    ) -> PipelineResult<String> {
        let sequence = self.assemble(state, mix_mode, music_url);
        if sequence.entries.is_empty() {
            return Err(PipelineError::NothingToExport);
        }

        let ordered_clip_urls: Vec<String> = sequence
            .entries
            .iter()
            .map(|e| e.video_url.clone())
            .collect();
        let voice_urls: Vec<Option<String>> = sequence
            .entries
            .iter()
            .map(|e| e.audio.first().map(|a| a.url.clone()))
            .collect();

        let response = self
            .service
            .export(&ExportRequest {
                ordered_clip_urls,
                audio_mix_mode: mix_mode,
                voice_urls,
                music_url: music_url.map(|s| s.to_string()),
            })
            .await
            .map_err(|e| PipelineError::export(e.to_string()))?;

        info!(
            clips = sequence.entries.len(),
            mix = %mix_mode,
            "Exported sequence"
        );
        Ok(response.artifact_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelforge_gen_client::{
        CritiqueRequest, CritiqueResponse, DebugRequest, DebugResponse, ExportResponse, GenError,
        GenResult, ScriptRequest, ScriptResponse, VideoGenRequest, VideoGenResponse,
        VisionRequest, VisionResponse, VoiceRequest, VoiceResponse,
    };
    use reelforge_models::{ProjectId, QualityTier, Shot, VoiceTrack};

    struct FixedExport;

    #[async_trait]
    impl GenerationService for FixedExport {
        async fn generate_script(&self, _request: &ScriptRequest) -> GenResult<ScriptResponse> {
            Err(GenError::RequestFailed("not scripted".into()))
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
        async fn export(&self, request: &ExportRequest) -> GenResult<ExportResponse> {
            Ok(ExportResponse {
                artifact_url: format!(
                    "https://cdn.example.com/export/{}-clips.mp4",
                    request.ordered_clip_urls.len()
                ),
            })
        }
    }

    fn state_with_completed_shots() -> ProductionState {
        let mut state = ProductionState::new(
            ProjectId::new(),
            vec![
                Shot::new(0, "Opening", "A drowned city at dawn").with_duration(10.0),
                Shot::new(1, "The Run", "The courier sprints across a rooftop")
                    .with_dialogue("Almost there.")
                    .with_duration(20.0),
                Shot::new(2, "Arrival", "The courier reaches the tower"),
            ],
            QualityTier::Standard,
        );
        state.shots[0].begin_generating();
        state.shots[0].complete("https://cdn.example.com/s01.mp4", "https://cdn.example.com/s01_end.png");
        state.shots[1].begin_generating();
        state.shots[1].complete("https://cdn.example.com/s02.mp4", "https://cdn.example.com/s02_end.png");
        state.set_voice_track(VoiceTrack {
            shot_id: ShotId::from_index(1),
            status: VoiceStatus::Completed,
            audio_url: Some("https://cdn.example.com/voice/s02.mp3".into()),
        });
        // Shot 3 stays pending and must not appear in the sequence.
        state
    }

    fn assembler() -> ReviewAssembler {
        ReviewAssembler::new(Arc::new(FixedExport))
    }

    #[test]
    fn test_assemble_orders_completed_shots_only() {
        let state = state_with_completed_shots();
        let sequence = assembler().assemble(&state, AudioMixMode::Full, None);

        assert_eq!(sequence.entries.len(), 2);
        assert_eq!(sequence.entries[0].shot_id.as_str(), "S01");
        assert_eq!(sequence.entries[1].shot_id.as_str(), "S02");
        assert_eq!(sequence.total_duration_seconds, 30.0);
    }

    #[test]
    fn test_mix_mode_sets_track_volumes() {
        let state = state_with_completed_shots();

        let full = assembler().assemble(&state, AudioMixMode::Full, Some("https://cdn.example.com/bed.mp3"));
        assert_eq!(full.entries[1].audio[0].volume, 1.0);
        assert!(full.music.as_ref().unwrap().volume > 0.0);

        let mute = assembler().assemble(&state, AudioMixMode::Mute, Some("https://cdn.example.com/bed.mp3"));
        assert_eq!(mute.entries[1].audio[0].volume, 0.0);
        assert_eq!(mute.music.as_ref().unwrap().volume, 0.0);
    }

    #[tokio::test]
    async fn test_export_delegates_with_ordered_clips() {
        let state = state_with_completed_shots();
        let artifact = assembler()
            .export(&state, AudioMixMode::Full, None)
            .await
            .unwrap();
        assert_eq!(artifact, "https://cdn.example.com/export/2-clips.mp4");
    }

    #[tokio::test]
    async fn test_export_with_no_completed_shots_fails() {
        let state = ProductionState::new(
            ProjectId::new(),
            vec![Shot::new(0, "Opening", "A drowned city at dawn")],
            QualityTier::Standard,
        );
        let err = assembler()
            .export(&state, AudioMixMode::Full, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NothingToExport));
    }
}
