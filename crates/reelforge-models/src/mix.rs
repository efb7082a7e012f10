//! Audio mix modes for review playback and export.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tracks are mixed, and at what volume, when reviewing or exporting
/// an assembled sequence.
///
/// For playback this only changes track volumes; nothing is re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioMixMode {
    /// Dialogue and music together
    #[default]
    Full,
    /// Dialogue only
    DialogueOnly,
    /// Music only
    MusicOnly,
    /// No audio
    Mute,
}

impl AudioMixMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioMixMode::Full => "full",
            AudioMixMode::DialogueOnly => "dialogue_only",
            AudioMixMode::MusicOnly => "music_only",
            AudioMixMode::Mute => "mute",
        }
    }

    /// Playback volume for dialogue tracks (0.0 - 1.0).
    pub fn dialogue_volume(&self) -> f32 {
        match self {
            AudioMixMode::Full | AudioMixMode::DialogueOnly => 1.0,
            AudioMixMode::MusicOnly | AudioMixMode::Mute => 0.0,
        }
    }

    /// Playback volume for the music bed (0.0 - 1.0). Music ducks under
    /// dialogue in the full mix.
    pub fn music_volume(&self) -> f32 {
        match self {
            AudioMixMode::Full => 0.35,
            AudioMixMode::MusicOnly => 1.0,
            AudioMixMode::DialogueOnly | AudioMixMode::Mute => 0.0,
        }
    }
}

impl fmt::Display for AudioMixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
