use askama::Template;
use axum::{extract::Path, response::IntoResponse};

use crate::auth::paths::Locale;
use crate::models::user::{CurrentUser, User};

#[derive(Template)]
#[template(path = "owner_dashboard.html")]
pub struct OwnerDashboardTemplate {
    pub user: User,
    pub locale: String,
}

pub async fn owner_dashboard_handler(
    Path(locale): Path<String>,
    current: CurrentUser,
) -> impl IntoResponse {
    OwnerDashboardTemplate {
        user: current.user,
        locale: Locale::new(&locale).to_string(),
    }
}
