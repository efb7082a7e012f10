//! In-memory repository for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use reelforge_models::{ProductionState, Project, ProjectId};

use crate::error::StoreResult;
use crate::repo::ProjectRepository;

/// In-memory [`ProjectRepository`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreState>>,
}

#[derive(Default)]
struct MemoryStoreState {
    projects: HashMap<ProjectId, Project>,
    productions: HashMap<ProjectId, ProductionState>,
    archived: HashMap<ProjectId, ProductionState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archived snapshot for a project, if any (test/introspection surface).
    pub async fn archived_production(&self, project_id: &ProjectId) -> Option<ProductionState> {
        self.inner.read().await.archived.get(project_id).cloned()
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn save_project(&self, project: &Project) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state.projects.insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn load_project(&self, project_id: &ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.inner.read().await.projects.get(project_id).cloned())
    }

    async fn save_production(&self, production: &ProductionState) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state
            .productions
            .insert(production.project_id.clone(), production.clone());
        Ok(())
    }

    async fn load_production(
        &self,
        project_id: &ProjectId,
    ) -> StoreResult<Option<ProductionState>> {
        Ok(self.inner.read().await.productions.get(project_id).cloned())
    }

    async fn archive_production(&self, project_id: &ProjectId) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        if let Some(production) = state.productions.remove(project_id) {
            debug!(project_id = %project_id, "Archived production run");
            state.archived.insert(project_id.clone(), production);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_models::{QualityTier, Shot};

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let store = MemoryStore::new();
        let state = ProductionState::new(
            ProjectId::new(),
            vec![Shot::new(0, "Opening", "A drowned city at dawn")],
            QualityTier::Standard,
        );

        store.save_production(&state).await.unwrap();
        let loaded = store.load_production(&state.project_id).await.unwrap().unwrap();
        assert_eq!(loaded.shots.len(), 1);
        assert_eq!(loaded.project_id, state.project_id);
    }

    #[tokio::test]
    async fn test_archive_removes_from_active_set() {
        let store = MemoryStore::new();
        let state = ProductionState::new(ProjectId::new(), vec![], QualityTier::Standard);

        store.save_production(&state).await.unwrap();
        store.archive_production(&state.project_id).await.unwrap();

        assert!(store.load_production(&state.project_id).await.unwrap().is_none());
        assert!(store.archived_production(&state.project_id).await.is_some());
    }
}
