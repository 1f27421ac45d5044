pub mod auth;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use crate::config::SessionSettings;
use services::auth_client::AuthApi;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state: the Auth API client, session policy, and the
/// shutdown token guard hydration selects against.
#[derive(Clone)]
pub struct AppState {
    pub auth_client: Arc<dyn AuthApi>,
    pub session: SessionSettings,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        auth_client: Arc<dyn AuthApi>,
        session: SessionSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            auth_client,
            session,
            shutdown,
        }
    }
}
