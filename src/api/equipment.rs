//! Equipment API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        equipment::{
            AssignEquipment, CreateEquipment, Equipment, NewActivity, RequestTransfer,
            UpdateEquipment,
        },
        notification::Notification,
    },
};

use super::AuthenticatedUser;

/// List all equipment
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Equipment list", body = Vec<Equipment>)
    )
)]
pub async fn list_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Equipment>>> {
    let equipment = state.services.equipment.list().await?;
    Ok(Json(equipment))
}

/// Get equipment by ID
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = Equipment)
    )
)]
pub async fn get_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.get_by_id(&id).await?;
    Ok(Json(equipment))
}

/// Create equipment
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = Equipment)
    )
)]
pub async fn create_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<Equipment>)> {
    claims.require_manage()?;
    let equipment = state.services.equipment.create(&data).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Update equipment descriptive fields
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment ID")),
    request_body = UpdateEquipment,
    responses(
        (status = 200, description = "Equipment updated", body = Equipment)
    )
)]
pub async fn update_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateEquipment>,
) -> AppResult<Json<Equipment>> {
    claims.require_manage()?;
    let equipment = state.services.equipment.update(&id, &data).await?;
    Ok(Json(equipment))
}

/// Delete equipment
#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment ID")),
    responses(
        (status = 204, description = "Equipment deleted")
    )
)]
pub async fn delete_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.equipment.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reassign equipment directly (admin/manager fast path, no approval)
#[utoipa::path(
    post,
    path = "/equipment/{id}/assign",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment ID")),
    request_body = AssignEquipment,
    responses(
        (status = 200, description = "Equipment reassigned", body = Equipment)
    )
)]
pub async fn assign_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<AssignEquipment>,
) -> AppResult<Json<Equipment>> {
    claims.require_manage()?;
    let equipment = state.services.equipment.assign(&id, &data).await?;
    Ok(Json(equipment))
}

/// Request a transfer, fanning a notification out to approvers
#[utoipa::path(
    post,
    path = "/equipment/{id}/transfer",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment ID")),
    request_body = RequestTransfer,
    responses(
        (status = 201, description = "Transfer requested", body = Notification),
        (status = 409, description = "A transfer is already pending")
    )
)]
pub async fn request_transfer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<RequestTransfer>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    let notification = state
        .services
        .transfers
        .request_transfer(&id, &data, &claims.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// Append an activity entry to the equipment log
#[utoipa::path(
    post,
    path = "/equipment/{id}/activity",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment ID")),
    request_body = NewActivity,
    responses(
        (status = 200, description = "Activity appended", body = Equipment)
    )
)]
pub async fn append_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<NewActivity>,
) -> AppResult<Json<Equipment>> {
    let equipment = state
        .services
        .equipment
        .append_activity(&id, &data, &claims.sub)
        .await?;
    Ok(Json(equipment))
}

/// Delete an activity entry by id (admin only)
#[utoipa::path(
    delete,
    path = "/equipment/{id}/activity/{entry_id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Equipment ID"),
        ("entry_id" = Uuid, Path, description = "Activity entry ID")
    ),
    responses(
        (status = 200, description = "Activity entry deleted", body = Equipment)
    )
)]
pub async fn delete_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, entry_id)): Path<(String, Uuid)>,
) -> AppResult<Json<Equipment>> {
    claims.require_admin()?;
    let equipment = state.services.equipment.delete_activity(&id, entry_id).await?;
    Ok(Json(equipment))
}
