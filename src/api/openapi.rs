//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{equipment, health, notifications, projects, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FieldOps API",
        version = "0.9.0",
        description = "Field Operations Gear Management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "FieldOps Team", email = "contact@fieldops.app")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        equipment::assign_equipment,
        equipment::request_transfer,
        equipment::append_activity,
        equipment::delete_activity,
        // Notifications
        notifications::list_notifications,
        notifications::accept_transfer,
        notifications::deny_transfer,
        notifications::mark_all_read,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_role,
        // Projects
        projects::list_projects,
        projects::get_project,
        projects::create_project,
    ),
    components(
        schemas(
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentStatus,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::models::equipment::AssignEquipment,
            crate::models::equipment::RequestTransfer,
            crate::models::equipment::NewActivity,
            crate::models::equipment::ActivityEntry,
            crate::models::equipment::ActivityKind,
            crate::models::equipment::PendingTransfer,
            crate::models::equipment::TransferEndpoint,
            crate::models::equipment::TransferTarget,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationKind,
            crate::models::notification::Decision,
            notifications::MarkReadResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::Role,
            crate::models::user::CreateUser,
            crate::models::user::UpdateRole,
            // Projects
            crate::models::project::Project,
            crate::models::project::CreateProject,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Equipment registry and transfer workflow"),
        (name = "notifications", description = "Notification mailboxes and approvals"),
        (name = "users", description = "Team directory"),
        (name = "projects", description = "Project directory")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
