pub mod auth_client;
pub mod metrics;

pub use auth_client::{AuthApi, AuthError, HttpAuthClient};
