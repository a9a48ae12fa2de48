//! Saved project storage.

use std::collections::HashMap;

use async_trait::async_trait;
use clab_models::{ProjectId, SavedProject};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::PipelineResult;

/// Persists session snapshots keyed by project id.
///
/// The pipeline never decides when to save; callers do.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn save(&self, project: SavedProject) -> PipelineResult<()>;

    async fn load(&self, id: &ProjectId) -> PipelineResult<Option<SavedProject>>;

    /// All projects, most recently modified first.
    async fn list(&self) -> PipelineResult<Vec<SavedProject>>;

    /// Returns whether a project was removed.
    async fn delete(&self, id: &ProjectId) -> PipelineResult<bool>;
}

#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    projects: RwLock<HashMap<ProjectId, SavedProject>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn save(&self, project: SavedProject) -> PipelineResult<()> {
        debug!(project_id = %project.id, "Saving project");
        self.projects.write().await.insert(project.id.clone(), project);
        Ok(())
    }

    async fn load(&self, id: &ProjectId) -> PipelineResult<Option<SavedProject>> {
        Ok(self.projects.read().await.get(id).cloned())
    }

    async fn list(&self) -> PipelineResult<Vec<SavedProject>> {
        let mut projects: Vec<_> = self.projects.read().await.values().cloned().collect();
        projects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(projects)
    }

    async fn delete(&self, id: &ProjectId) -> PipelineResult<bool> {
        Ok(self.projects.write().await.remove(id).is_some())
    }
}
