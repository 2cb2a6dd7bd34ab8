//! Project directory API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::project::{CreateProject, Project},
};

use super::AuthenticatedUser;

/// List all projects
#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Project list", body = Vec<Project>)
    )
)]
pub async fn list_projects(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Project>>> {
    let projects = state.services.projects.list().await?;
    Ok(Json(projects))
}

/// Get project by ID
#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project details", body = Project)
    )
)]
pub async fn get_project(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Project>> {
    let project = state.services.projects.get_by_id(&id).await?;
    Ok(Json(project))
}

/// Create a project
#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    security(("bearer_auth" = [])),
    request_body = CreateProject,
    responses(
        (status = 201, description = "Project created", body = Project)
    )
)]
pub async fn create_project(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    claims.require_manage()?;
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let project = state.services.projects.create(&data).await?;
    Ok((StatusCode::CREATED, Json(project)))
}
