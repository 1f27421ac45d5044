use async_trait::async_trait;
use rental_core::observability::TracedClientExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthServiceSettings;
use crate::models::user::{Role, User};

/// How a call to the Auth API failed. The session engine cares about the
/// difference: a rejection means the token was judged and refused, while an
/// unreachable service judged nothing.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth request rejected with status {status}")]
    Rejected { status: u16, code: Option<String> },

    #[error("auth service unreachable: {0}")]
    Unreachable(String),

    #[error("malformed auth response: {0}")]
    Decode(String),
}

impl AuthError {
    pub fn is_transport(&self) -> bool {
        matches!(self, AuthError::Unreachable(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
}

/// The externally owned Auth API, as the portal consumes it. Every
/// operation except `login` is idempotent.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError>;
    async fn validate_session(&self, token: &str) -> Result<User, AuthError>;
    async fn refresh_token(&self, token: &str) -> Result<RefreshedToken, AuthError>;
    async fn logout(&self, token: &str) -> Result<(), AuthError>;
    async fn register(&self, request: &RegisterRequest) -> Result<(), AuthError>;
}

pub struct HttpAuthClient {
    client: Client,
    settings: AuthServiceSettings,
}

impl HttpAuthClient {
    pub fn new(settings: AuthServiceSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    pub fn public_url(&self) -> &str {
        &self.settings.public_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url, path)
    }
}

fn send_failure(url: &str, err: reqwest::Error) -> AuthError {
    tracing::error!("Failed to reach auth service at {}: {}", url, err);
    AuthError::Unreachable(err.to_string())
}

/// Turn a non-success response into `Rejected`, salvaging the error code
/// from the `{error, details}` body when there is one.
async fn rejection(response: reqwest::Response) -> AuthError {
    let status = response.status().as_u16();
    let code = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body["error"].as_str().map(str::to_string));
    AuthError::Rejected { status, code }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let url = self.url("/auth/login");
        let response = self
            .client
            .traced_post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| send_failure(&url, e))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        response
            .json::<LoginResponse>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn validate_session(&self, token: &str) -> Result<User, AuthError> {
        let url = self.url("/users/me");
        let response = self
            .client
            .traced_get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| send_failure(&url, e))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        response
            .json::<User>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn refresh_token(&self, token: &str) -> Result<RefreshedToken, AuthError> {
        let url = self.url("/auth/refresh");
        let response = self
            .client
            .traced_post(&url)
            .json(&serde_json::json!({ "refresh_token": token }))
            .send()
            .await
            .map_err(|e| send_failure(&url, e))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        response
            .json::<RefreshedToken>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let url = self.url("/auth/logout");
        let response = self
            .client
            .traced_post(&url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| send_failure(&url, e))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), AuthError> {
        let url = self.url("/auth/register");
        let response = self
            .client
            .traced_post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| send_failure(&url, e))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}
