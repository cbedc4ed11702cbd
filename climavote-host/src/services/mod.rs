mod auth_service;
mod history_service;
mod station;

pub use auth_service::*;
pub use history_service::*;
pub use station::*;
