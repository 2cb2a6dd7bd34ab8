//! Notification record stored in user mailboxes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Notification type tag; only transfer requests are actionable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum NotificationKind {
    #[serde(rename = "gear-transfer-request")]
    GearTransferRequest,
}

/// Resolution outcome of a transfer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Denied,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Accepted => write!(f, "accepted"),
            Decision::Denied => write!(f, "denied"),
        }
    }
}

/// One notification copy. The same logical notification (keyed by `id`,
/// of the form `<equipment_id>_<request_millis>`) is fanned out into
/// every eligible approver's mailbox; resolution rewrites every copy.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Correlation key shared by all mailbox copies
    pub id: String,
    pub kind: NotificationKind,
    pub equipment_id: String,
    /// Name snapshot taken at request time, for display only
    pub equipment_name: String,
    pub from_user_id: Option<String>,
    pub from_project_id: Option<String>,
    pub to_user_id: String,
    pub to_project_id: Option<String>,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    /// True while the underlying transfer is unresolved
    pub pending: bool,
    /// Set on resolution; identical across all copies afterwards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    /// Per-viewer unread flag; mark-all-read flips this without
    /// touching `pending` or `decision`
    #[serde(default)]
    pub read: bool,
}
