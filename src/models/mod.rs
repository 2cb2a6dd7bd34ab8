//! Domain models

pub mod equipment;
pub mod notification;
pub mod project;
pub mod user;
