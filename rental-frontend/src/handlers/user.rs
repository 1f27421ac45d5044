use askama::Template;
use axum::{extract::Path, response::IntoResponse};

use crate::auth::paths::Locale;
use crate::models::user::{CurrentUser, User};

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: User,
    pub locale: String,
}

#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub user: User,
    pub locale: String,
}

pub async fn dashboard_handler(
    Path(locale): Path<String>,
    current: CurrentUser,
) -> impl IntoResponse {
    DashboardTemplate {
        user: current.user,
        locale: Locale::new(&locale).to_string(),
    }
}

/// Profile page for any signed-in role.
pub async fn account_handler(
    Path(locale): Path<String>,
    current: CurrentUser,
) -> impl IntoResponse {
    AccountTemplate {
        user: current.user,
        locale: Locale::new(&locale).to_string(),
    }
}
