//! Team directory API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateRole, User, UserShort},
};

use super::AuthenticatedUser;

/// List the team directory
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Team directory", body = Vec<UserShort>)
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserShort>>> {
    let users = state.services.users.list().await?;
    Ok(Json(users))
}

/// Get a user profile by ID. Only the profile owner or an admin may
/// see the embedded mailbox.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = User)
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<User>> {
    if claims.sub != id {
        claims.require_admin()?;
    }
    let user = state.services.users.get_by_id(&id).await?;
    Ok(Json(user))
}

/// Create a user profile (admin only)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 409, description = "User already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_admin()?;
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let user = state.services.users.create(&data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Change a user's role (admin only)
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = UserShort)
    )
)]
pub async fn update_role(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateRole>,
) -> AppResult<Json<UserShort>> {
    claims.require_admin()?;
    let user = state.services.users.set_role(&id, data.role).await?;
    Ok(Json(user))
}
