//! Project repository trait.

use async_trait::async_trait;

use reelforge_models::{ProductionState, Project, ProjectId};

use crate::error::StoreResult;

/// Persistence surface for project records and production snapshots.
///
/// Snapshots are whole-value upserts: the orchestrator persists after every
/// state transition, so the stored record always reflects the latest shot
/// statuses and clip URLs.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Upsert a project record.
    async fn save_project(&self, project: &Project) -> StoreResult<()>;

    /// Load a project record.
    async fn load_project(&self, project_id: &ProjectId) -> StoreResult<Option<Project>>;

    /// Upsert the production snapshot for a run.
    async fn save_production(&self, state: &ProductionState) -> StoreResult<()>;

    /// Load the production snapshot for a project, if a run exists.
    async fn load_production(&self, project_id: &ProjectId) -> StoreResult<Option<ProductionState>>;

    /// Archive a finished run: the snapshot is removed from the active set.
    async fn archive_production(&self, project_id: &ProjectId) -> StoreResult<()>;
}
