use askama::Template;
use axum::{extract::Path, response::IntoResponse};

use crate::auth::paths::Locale;
use crate::models::user::{CurrentUser, User};

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub user: User,
    pub locale: String,
}

pub async fn admin_dashboard_handler(
    Path(locale): Path<String>,
    current: CurrentUser,
) -> impl IntoResponse {
    AdminTemplate {
        user: current.user,
        locale: Locale::new(&locale).to_string(),
    }
}
