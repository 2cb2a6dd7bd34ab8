//! Equipment registry service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::equipment::{
        ActivityEntry, ActivityKind, AssignEquipment, CreateEquipment, Equipment, NewActivity,
        UpdateEquipment,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all equipment
    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list().await
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Equipment> {
        self.repository.equipment.get_by_id(id).await
    }

    /// Create equipment
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        if let Some(assignee) = data.assignee_user_id.as_deref() {
            self.repository.users.get_by_id(assignee).await?;
        }
        if let Some(project) = data.project_id.as_deref() {
            self.repository.projects.get_by_id(project).await?;
        }
        self.repository.equipment.create(data).await
    }

    /// Update descriptive fields
    pub async fn update(&self, id: &str, data: &UpdateEquipment) -> AppResult<Equipment> {
        self.repository.equipment.update(id, data).await
    }

    /// Delete equipment
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.repository.equipment.delete(id).await
    }

    /// Direct reassignment, bypassing the transfer workflow. Does not
    /// append an activity entry; callers wanting an audit trail add one
    /// explicitly.
    pub async fn assign(&self, id: &str, data: &AssignEquipment) -> AppResult<Equipment> {
        if let Some(user_id) = data.user_id.as_deref() {
            self.repository.users.get_by_id(user_id).await?;
        }
        if let Some(project_id) = data.project_id.as_deref() {
            self.repository.projects.get_by_id(project_id).await?;
        }
        self.repository
            .equipment
            .set_assignment(id, data.user_id.as_deref(), data.project_id.as_deref())
            .await
    }

    /// Append an activity entry
    pub async fn append_activity(
        &self,
        id: &str,
        data: &NewActivity,
        actor: &str,
    ) -> AppResult<Equipment> {
        let mut tx = self.repository.pool.begin().await?;
        let equipment = self.repository.equipment.get_for_update(&mut tx, id).await?;

        let mut activity = equipment.activity.clone();
        activity.push(ActivityEntry {
            id: Uuid::new_v4(),
            kind: data.kind.unwrap_or(ActivityKind::Note),
            timestamp: Utc::now(),
            from: None,
            to: None,
            actor: actor.to_string(),
            note: data.note.clone(),
        });

        self.repository
            .equipment
            .store_activity(&mut tx, id, equipment.version, &activity)
            .await?;
        tx.commit().await?;

        self.repository.equipment.get_by_id(id).await
    }

    /// Delete an activity entry by its stable id (admin only)
    pub async fn delete_activity(&self, id: &str, entry_id: Uuid) -> AppResult<Equipment> {
        let mut tx = self.repository.pool.begin().await?;
        let equipment = self.repository.equipment.get_for_update(&mut tx, id).await?;

        let mut activity = equipment.activity.clone();
        let before = activity.len();
        activity.retain(|entry| entry.id != entry_id);
        if activity.len() == before {
            return Err(AppError::NotFound(format!(
                "Activity entry {} not found on equipment {}",
                entry_id, id
            )));
        }

        self.repository
            .equipment
            .store_activity(&mut tx, id, equipment.version, &activity)
            .await?;
        tx.commit().await?;

        self.repository.equipment.get_by_id(id).await
    }
}
