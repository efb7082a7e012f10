//! Project records — the persisted state surface around a production run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::Shot;

/// Unique identifier for a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created, no script yet
    #[default]
    Draft,
    /// Script generated and broken down into shots
    ScriptReady,
    /// Cinematic audit approved, production may start
    Approved,
    /// A production run is in progress
    Producing,
    /// All shots completed
    Completed,
    /// Production halted on a failed shot
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::ScriptReady => "script_ready",
            ProjectStatus::Approved => "approved",
            ProjectStatus::Producing => "producing",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to break a synopsis down into a shot list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct BreakdownRequest {
    /// Working title
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Genre keyword steering tone
    #[validate(length(min = 1, max = 64))]
    pub genre: String,
    /// Story synopsis to break down
    #[validate(length(min = 1))]
    pub synopsis: String,
    /// Target total duration across all shots, in seconds
    #[validate(range(min = 1.0, max = 3600.0))]
    pub target_duration_seconds: f64,
}

/// Persisted project record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    /// Unique project ID
    pub id: ProjectId,

    /// Working title
    pub title: String,

    /// Genre keyword
    pub genre: String,

    /// Story synopsis
    pub synopsis: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: ProjectStatus,

    /// Raw narrative text returned by script generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_script: Option<String>,

    /// Draft shot list (pre-production; owned by the run once started)
    #[serde(default)]
    pub shots: Vec<Shot>,

    /// URLs of produced clips, in shot order
    #[serde(default)]
    pub clip_urls: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new draft project from a breakdown request.
    pub fn new(request: &BreakdownRequest) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            title: request.title.clone(),
            genre: request.genre.clone(),
            synopsis: request.synopsis.clone(),
            status: ProjectStatus::Draft,
            generated_script: None,
            shots: Vec::new(),
            clip_urls: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record the generated script and parsed shot list.
    pub fn set_breakdown(&mut self, raw_script: impl Into<String>, shots: Vec<Shot>) {
        self.generated_script = Some(raw_script.into());
        self.shots = shots;
        self.status = ProjectStatus::ScriptReady;
        self.touch();
    }

    /// Update the lifecycle status.
    pub fn set_status(&mut self, status: ProjectStatus) {
        self.status = status;
        self.touch();
    }

    /// Append a produced clip URL.
    pub fn push_clip_url(&mut self, url: impl Into<String>) {
        self.clip_urls.push(url.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn request() -> BreakdownRequest {
        BreakdownRequest {
            title: "The Last Courier".into(),
            genre: "thriller".into(),
            synopsis: "A courier carries the last message across a drowned city.".into(),
            target_duration_seconds: 60.0,
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(request().validate().is_ok());

        let mut bad = request();
        bad.title = String::new();
        assert!(bad.validate().is_err());

        let mut bad = request();
        bad.target_duration_seconds = 0.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_breakdown_moves_status() {
        let mut project = Project::new(&request());
        assert_eq!(project.status, ProjectStatus::Draft);

        project.set_breakdown("SCENE 1: ...", vec![Shot::new(0, "Opening", "A drowned city")]);
        assert_eq!(project.status, ProjectStatus::ScriptReady);
        assert!(project.generated_script.is_some());
        assert_eq!(project.shots.len(), 1);
    }
}
