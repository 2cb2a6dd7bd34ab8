//! Project directory model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Project: a read-mostly directory entry (id to display name). The
/// workflow stores only project ids, never resolved names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub site: Option<String>,
    pub crea_date: Option<DateTime<Utc>>,
}

/// Create project request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProject {
    #[validate(length(min = 1, message = "Project name must not be empty"))]
    pub name: String,
    pub site: Option<String>,
}
