//! Equipment repository for database operations

use chrono::Utc;
use sqlx::{types::Json, Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::equipment::{
        ActivityEntry, CreateEquipment, Equipment, EquipmentRow, PendingTransfer, UpdateEquipment,
    },
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all equipment
    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, EquipmentRow>("SELECT * FROM equipment ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Equipment::from).collect())
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Equipment> {
        sqlx::query_as::<_, EquipmentRow>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Equipment::from)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Get equipment by ID with a row lock, inside a workflow transaction
    pub async fn get_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
    ) -> AppResult<Equipment> {
        sqlx::query_as::<_, EquipmentRow>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .map(Equipment::from)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Create equipment
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let id = Uuid::new_v4().to_string();
        let row = sqlx::query_as::<_, EquipmentRow>(
            r#"
            INSERT INTO equipment
                (id, name, category, serial_number, notes, assignee_user_id, project_id, date_added)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&data.name)
        .bind(&data.category)
        .bind(&data.serial_number)
        .bind(&data.notes)
        .bind(&data.assignee_user_id)
        .bind(&data.project_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Update equipment descriptive fields
    pub async fn update(&self, id: &str, data: &UpdateEquipment) -> AppResult<Equipment> {
        let current = self.get_by_id(id).await?;
        let status: i16 = data.status.unwrap_or(current.status).into();

        sqlx::query_as::<_, EquipmentRow>(
            r#"
            UPDATE equipment
            SET name = $2, category = $3, status = $4, serial_number = $5, notes = $6,
                version = version + 1
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.as_ref().unwrap_or(&current.name))
        .bind(data.category.as_ref().or(current.category.as_ref()))
        .bind(status)
        .bind(data.serial_number.as_ref().or(current.serial_number.as_ref()))
        .bind(data.notes.as_ref().or(current.notes.as_ref()))
        .fetch_optional(&self.pool)
        .await?
        .map(Equipment::from)
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Delete equipment
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(())
    }

    /// Overwrite assignee/project (direct-reassignment fast path).
    /// Deliberately does not touch the activity log.
    pub async fn set_assignment(
        &self,
        id: &str,
        user_id: Option<&str>,
        project_id: Option<&str>,
    ) -> AppResult<Equipment> {
        sqlx::query_as::<_, EquipmentRow>(
            r#"
            UPDATE equipment
            SET assignee_user_id = $2, project_id = $3, version = version + 1
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Equipment::from)
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Write the workflow-owned fields (assignment, pending marker,
    /// activity log) under the optimistic-concurrency version guard.
    /// A concurrent writer that advanced the version turns this into a
    /// Conflict instead of a silent lost update.
    pub async fn store_workflow_state(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
        expected_version: i32,
        assignee_user_id: Option<&str>,
        project_id: Option<&str>,
        pending_transfer: Option<&PendingTransfer>,
        activity: &[ActivityEntry],
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE equipment
            SET assignee_user_id = $3, project_id = $4, pending_transfer = $5,
                activity = $6, version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(assignee_user_id)
        .bind(project_id)
        .bind(pending_transfer.map(Json))
        .bind(Json(activity))
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Equipment {} was modified concurrently",
                id
            )));
        }
        Ok(())
    }

    /// Rewrite the activity log alone, version-guarded
    pub async fn store_activity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
        expected_version: i32,
        activity: &[ActivityEntry],
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE equipment SET activity = $3, version = version + 1 WHERE id = $1 AND version = $2",
        )
        .bind(id)
        .bind(expected_version)
        .bind(Json(activity))
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Equipment {} was modified concurrently",
                id
            )));
        }
        Ok(())
    }
}
