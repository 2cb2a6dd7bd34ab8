//! Projects repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::project::{CreateProject, Project},
};

#[derive(Clone)]
pub struct ProjectsRepository {
    pool: Pool<Postgres>,
}

impl ProjectsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all projects
    pub async fn list(&self) -> AppResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get project by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Project> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))
    }

    /// Create a project
    pub async fn create(&self, data: &CreateProject) -> AppResult<Project> {
        let id = Uuid::new_v4().to_string();
        let row = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, site, crea_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&data.name)
        .bind(&data.site)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
