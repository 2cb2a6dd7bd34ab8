//! Notification mailbox API endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        equipment::Equipment,
        notification::{Decision, Notification},
    },
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct MarkReadResponse {
    /// Number of notifications newly marked read
    pub marked: usize,
}

/// List the caller's own mailbox, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Mailbox contents", body = Vec<Notification>)
    )
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Notification>>> {
    let mailbox = state.services.notifications.list(&claims.sub).await?;
    Ok(Json(mailbox))
}

/// Accept a pending transfer
#[utoipa::path(
    post,
    path = "/notifications/{id}/accept",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Transfer accepted", body = Equipment),
        (status = 403, description = "Caller may not resolve this transfer"),
        (status = 409, description = "Transfer already resolved differently")
    )
)]
pub async fn accept_transfer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Equipment>> {
    let equipment = state
        .services
        .transfers
        .resolve(&id, Decision::Accepted, &claims.sub, claims.role)
        .await?;
    Ok(Json(equipment))
}

/// Deny a pending transfer
#[utoipa::path(
    post,
    path = "/notifications/{id}/deny",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Transfer denied", body = Equipment),
        (status = 403, description = "Caller may not resolve this transfer"),
        (status = 409, description = "Transfer already resolved differently")
    )
)]
pub async fn deny_transfer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Equipment>> {
    let equipment = state
        .services
        .transfers
        .resolve(&id, Decision::Denied, &claims.sub, claims.role)
        .await?;
    Ok(Json(equipment))
}

/// Mark every notification in the caller's mailbox as read. Only the
/// per-viewer unread flag changes; pending transfers stay actionable.
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Mailbox marked read", body = MarkReadResponse)
    )
)]
pub async fn mark_all_read(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MarkReadResponse>> {
    let marked = state.services.notifications.mark_all_read(&claims.sub).await?;
    Ok(Json(MarkReadResponse { marked }))
}
