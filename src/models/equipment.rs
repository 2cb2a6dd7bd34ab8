//! Equipment record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

/// Equipment status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum EquipmentStatus {
    Available = 0,
    InUse = 1,
    Maintenance = 2,
    Retired = 3,
}

impl From<i16> for EquipmentStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => EquipmentStatus::InUse,
            2 => EquipmentStatus::Maintenance,
            3 => EquipmentStatus::Retired,
            _ => EquipmentStatus::Available,
        }
    }
}

impl From<EquipmentStatus> for i16 {
    fn from(s: EquipmentStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EquipmentStatus::Available => "Available",
            EquipmentStatus::InUse => "In Use",
            EquipmentStatus::Maintenance => "Maintenance",
            EquipmentStatus::Retired => "Retired",
        };
        write!(f, "{}", label)
    }
}

/// Source side of a transfer; the gear may currently be unassigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferEndpoint {
    pub user_id: Option<String>,
    pub project_id: Option<String>,
}

/// Destination side of a transfer; a recipient user is always named
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferTarget {
    pub user_id: String,
    pub project_id: Option<String>,
}

/// Single-slot pending-transfer marker. At most one unresolved
/// transfer exists per equipment record; a second request while this
/// is set is rejected as a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PendingTransfer {
    /// Matches the id of the notification copies fanned out at request time
    pub notification_id: String,
    pub from: TransferEndpoint,
    pub to: TransferTarget,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
}

/// Activity entry type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ActivityKind {
    #[serde(rename = "transfer-accepted")]
    TransferAccepted,
    #[serde(rename = "transfer-denied")]
    TransferDenied,
    /// Legacy tag kept for records imported from the previous system
    #[serde(rename = "transfer")]
    Transfer,
    #[serde(rename = "note")]
    Note,
}

/// One entry in the append-only activity log. Entries carry a stable
/// id so deletion is unambiguous under concurrent mutation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<TransferEndpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<TransferTarget>,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Internal row structure for equipment queries
#[derive(Debug, Clone, FromRow)]
pub struct EquipmentRow {
    id: String,
    name: String,
    category: Option<String>,
    status: i16,
    serial_number: Option<String>,
    notes: Option<String>,
    assignee_user_id: Option<String>,
    project_id: Option<String>,
    date_added: DateTime<Utc>,
    version: i32,
    pending_transfer: Option<Json<PendingTransfer>>,
    activity: Json<Vec<ActivityEntry>>,
}

impl From<EquipmentRow> for Equipment {
    fn from(row: EquipmentRow) -> Self {
        Equipment {
            id: row.id,
            name: row.name,
            category: row.category,
            status: row.status.into(),
            serial_number: row.serial_number,
            notes: row.notes,
            assignee_user_id: row.assignee_user_id,
            project_id: row.project_id,
            date_added: row.date_added,
            version: row.version,
            pending_transfer: row.pending_transfer.map(|j| j.0),
            activity: row.activity.0,
        }
    }
}

/// Equipment record: the authoritative document for one piece of gear
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub status: EquipmentStatus,
    pub serial_number: Option<String>,
    pub notes: Option<String>,
    pub assignee_user_id: Option<String>,
    pub project_id: Option<String>,
    pub date_added: DateTime<Utc>,
    /// Optimistic-concurrency stamp, incremented on every workflow write
    pub version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_transfer: Option<PendingTransfer>,
    pub activity: Vec<ActivityEntry>,
}

/// Create equipment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEquipment {
    pub name: String,
    pub category: Option<String>,
    pub serial_number: Option<String>,
    pub notes: Option<String>,
    pub assignee_user_id: Option<String>,
    pub project_id: Option<String>,
}

/// Update equipment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub category: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub serial_number: Option<String>,
    pub notes: Option<String>,
}

/// Direct reassignment request (admin/manager fast path). Absent
/// fields clear the corresponding assignment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignEquipment {
    pub user_id: Option<String>,
    pub project_id: Option<String>,
}

/// Transfer request body. The `from` side defaults to the record's
/// current assignment when omitted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestTransfer {
    pub to_user_id: String,
    pub to_project_id: Option<String>,
    pub from_user_id: Option<String>,
    pub from_project_id: Option<String>,
}

/// Append-activity request; id, timestamp and actor are server-filled
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewActivity {
    pub kind: Option<ActivityKind>,
    pub note: Option<String>,
}
