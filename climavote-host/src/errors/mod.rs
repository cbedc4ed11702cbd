mod auth;
mod station;

pub use auth::AuthError;
pub use station::StationError;
