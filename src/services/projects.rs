//! Project directory service

use crate::{
    error::AppResult,
    models::project::{CreateProject, Project},
    repository::Repository,
};

#[derive(Clone)]
pub struct ProjectsService {
    repository: Repository,
}

impl ProjectsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all projects
    pub async fn list(&self) -> AppResult<Vec<Project>> {
        self.repository.projects.list().await
    }

    /// Get project by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Project> {
        self.repository.projects.get_by_id(id).await
    }

    /// Create a project
    pub async fn create(&self, data: &CreateProject) -> AppResult<Project> {
        self.repository.projects.create(data).await
    }
}
