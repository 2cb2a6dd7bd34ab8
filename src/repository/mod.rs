//! Repository layer for database operations

pub mod equipment;
pub mod projects;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub equipment: equipment::EquipmentRepository,
    pub users: users::UsersRepository,
    pub projects: projects::ProjectsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            equipment: equipment::EquipmentRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            projects: projects::ProjectsRepository::new(pool.clone()),
            pool,
        }
    }
}
