//! Users repository: profiles, roles and embedded mailboxes

use chrono::Utc;
use sqlx::{types::Json, Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        notification::Notification,
        user::{CreateUser, Role, User, UserRow, UserShort},
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all users (directory view, without mailboxes)
    pub async fn list(&self) -> AppResult<Vec<UserShort>> {
        let rows = sqlx::query_as::<_, UserShort>(
            "SELECT id, display_name, email, role FROM users ORDER BY display_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a full user profile (including the mailbox) by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// List users holding any of the given roles (fan-out enumeration)
    pub async fn list_by_roles(&self, roles: &[Role]) -> AppResult<Vec<UserShort>> {
        let slugs: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        let rows = sqlx::query_as::<_, UserShort>(
            "SELECT id, display_name, email, role FROM users WHERE role = ANY($1) ORDER BY id",
        )
        .bind(&slugs)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create a user profile with an empty mailbox
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let role = data.role.unwrap_or(Role::Member);
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, display_name, email, role, notifications, crea_date)
            VALUES ($1, $2, $3, $4, '[]'::jsonb, $5)
            RETURNING *
            "#,
        )
        .bind(&data.id)
        .bind(&data.display_name)
        .bind(&data.email)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("User {} already exists", data.id))
            }
            _ => AppError::from(e),
        })?;
        Ok(row.into())
    }

    /// Change a user's role
    pub async fn set_role(&self, id: &str, role: Role) -> AppResult<UserShort> {
        sqlx::query_as::<_, UserShort>(
            r#"
            UPDATE users SET role = $2 WHERE id = $1
            RETURNING id, display_name, email, role
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Append a notification copy to one mailbox. `||` appends
    /// atomically, so concurrent fan-outs to the same mailbox cannot
    /// drop each other's copies.
    pub async fn append_notification(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: &str,
        notification: &Notification,
    ) -> AppResult<()> {
        let element = serde_json::to_value(notification)
            .map_err(|e| AppError::Internal(format!("Failed to encode notification: {}", e)))?;
        let result = sqlx::query(
            "UPDATE users SET notifications = notifications || jsonb_build_array($2::jsonb) WHERE id = $1",
        )
        .bind(user_id)
        .bind(element)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    /// Lock and return every mailbox holding a copy of the given
    /// notification id
    pub async fn mailboxes_containing(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        notification_id: &str,
    ) -> AppResult<Vec<(String, Vec<Notification>)>> {
        let probe = serde_json::json!([{ "id": notification_id }]);
        let rows = sqlx::query_as::<_, (String, Json<Vec<Notification>>)>(
            "SELECT id, notifications FROM users WHERE notifications @> $1 ORDER BY id FOR UPDATE",
        )
        .bind(probe)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows.into_iter().map(|(id, mbox)| (id, mbox.0)).collect())
    }

    /// Write a full mailbox back (within the locking transaction)
    pub async fn write_mailbox(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: &str,
        notifications: &[Notification],
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET notifications = $2 WHERE id = $1")
            .bind(user_id)
            .bind(Json(notifications))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Lock one user's mailbox for a read-modify-write
    pub async fn get_mailbox_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: &str,
    ) -> AppResult<Vec<Notification>> {
        let row = sqlx::query_as::<_, (Json<Vec<Notification>>,)>(
            "SELECT notifications FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        Ok(row.0 .0)
    }
}
