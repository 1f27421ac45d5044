use askama::Template;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session as TowerSession;
use validator::Validate;

use crate::auth::{dashboard_path, CookieSessionStorage, Locale, SessionStore, SessionStorage};
use crate::models::user::Role;
use crate::services::auth_client::{AuthError, Credentials, RegisterRequest};
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub locale: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub locale: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub account_type: String,
}

fn error_fragment(message: &str) -> Html<String> {
    Html(format!("<p class='text-red-500 text-sm'>{}</p>", message))
}

pub async fn login_page(Path(locale): Path<String>) -> impl IntoResponse {
    LoginTemplate {
        locale: Locale::new(&locale).to_string(),
    }
}

pub async fn register_page(Path(locale): Path<String>) -> impl IntoResponse {
    RegisterTemplate {
        locale: Locale::new(&locale).to_string(),
    }
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: TowerSession,
    Path(locale): Path<String>,
    Form(payload): Form<LoginForm>,
) -> impl IntoResponse {
    let locale = Locale::new(&locale);
    let credentials = Credentials {
        email: payload.email,
        password: payload.password,
    };

    match state.auth_client.login(&credentials).await {
        Ok(response) => {
            let mut store = SessionStore::new(
                CookieSessionStorage::new(session),
                state.session.offline_grace,
            );
            let target = dashboard_path(response.user.role, &locale);

            if let Err(err) = store.login(response.user.clone(), response.access_token).await {
                tracing::error!("Failed to persist session after login: {}", err);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_fragment("Something went wrong, please try again"),
                )
                    .into_response();
            }

            tracing::info!(
                user_id = %response.user.id,
                role = response.user.role.as_wire(),
                "User logged in successfully"
            );

            // HTMX redirect to the role's own dashboard
            let mut headers = HeaderMap::new();
            if let Ok(value) = target.parse() {
                headers.insert("HX-Redirect", value);
            }
            (StatusCode::OK, headers, "").into_response()
        }
        Err(AuthError::Rejected { .. }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_fragment("Invalid email or password"),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Login call to auth service failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                error_fragment("Sign-in is temporarily unavailable, please try again"),
            )
                .into_response()
        }
    }
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(payload): Form<RegisterForm>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|field| field.iter())
            .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| "Please check the form and try again".to_string());
        return (StatusCode::UNPROCESSABLE_ENTITY, error_fragment(&message)).into_response();
    }

    let role = Role::from_wire(&payload.account_type);
    if !matches!(role, Role::Customer | Role::VehicleOwner) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_fragment("Select a valid account type"),
        )
            .into_response();
    }

    let request = RegisterRequest {
        email: payload.email,
        password: payload.password,
        first_name: payload.first_name,
        last_name: payload.last_name,
        role,
    };

    match state.auth_client.register(&request).await {
        Ok(()) => (
            StatusCode::OK,
            Html(
                "<p class='text-emerald-500 text-sm'>Registration successful! Sign in to continue.</p>"
                    .to_string(),
            ),
        )
            .into_response(),
        Err(AuthError::Rejected { .. }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_fragment("Registration failed. Email might already be in use"),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Register call to auth service failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                error_fragment("Registration is temporarily unavailable, please try again"),
            )
                .into_response()
        }
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    session: TowerSession,
) -> impl IntoResponse {
    let storage = CookieSessionStorage::new(session);

    // Revoke the token if there is one; a failed revocation never blocks
    // the local logout.
    if let Some(record) = storage.load().await {
        if let Err(err) = state.auth_client.logout(&record.token).await {
            tracing::error!("Failed to revoke token during logout: {}", err);
        } else {
            tracing::info!(user_id = %record.user.id, "Token revoked successfully");
        }
    }

    let mut store = SessionStore::new(storage, state.session.offline_grace);
    store.logout().await;

    Redirect::to("/")
}
