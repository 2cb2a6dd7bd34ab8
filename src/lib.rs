//! FieldOps Gear Management Server
//!
//! REST API backend for field-operations gear tracking: an equipment
//! registry, per-user notification mailboxes, and the transfer-approval
//! workflow that moves gear between users and projects.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
