//! Team directory service

use crate::{
    error::AppResult,
    models::user::{CreateUser, Role, User, UserShort},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List the team directory
    pub async fn list(&self) -> AppResult<Vec<UserShort>> {
        self.repository.users.list().await
    }

    /// Get a user profile by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a user profile for an identity-provider uid
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        self.repository.users.create(data).await
    }

    /// Change a user's role
    pub async fn set_role(&self, id: &str, role: Role) -> AppResult<UserShort> {
        self.repository.users.set_role(id, role).await
    }
}
