//! Business logic services

pub mod email;
pub mod equipment;
pub mod notifications;
pub mod projects;
pub mod transfers;
pub mod users;

use crate::{config::EmailConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub equipment: equipment::EquipmentService,
    pub transfers: transfers::TransfersService,
    pub notifications: notifications::NotificationsService,
    pub users: users::UsersService,
    pub projects: projects::ProjectsService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, email_config: EmailConfig) -> Self {
        let email = email::EmailService::new(email_config);
        Self {
            equipment: equipment::EquipmentService::new(repository.clone()),
            transfers: transfers::TransfersService::new(repository.clone(), email.clone()),
            notifications: notifications::NotificationsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            projects: projects::ProjectsService::new(repository),
            email,
        }
    }
}
