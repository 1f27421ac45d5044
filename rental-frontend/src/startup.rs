use axum::{middleware::from_fn, middleware::from_fn_with_state, routing::get, Router};
use rental_core::middleware::tracing::request_id_middleware;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    admin::admin_dashboard_handler,
    app::{health_check, index},
    auth::{login_handler, login_page, logout_handler, register_handler, register_page},
    owner::owner_dashboard_handler,
    user::{account_handler, dashboard_handler},
};
use crate::middleware::auth::{
    guest_guard, require_admin, require_auth, require_customer, require_owner,
};
use crate::middleware::metrics::metrics_middleware;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            state.session.inactivity_expiry_hours,
        )));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .route(
            "/:locale/login",
            get(login_page)
                .post(login_handler)
                .layer(from_fn_with_state(state.clone(), guest_guard)),
        )
        .route(
            "/:locale/register",
            get(register_page)
                .post(register_handler)
                .layer(from_fn_with_state(state.clone(), guest_guard)),
        )
        .route("/:locale/logout", get(logout_handler))
        .route(
            "/:locale/dashboard",
            get(dashboard_handler).layer(from_fn_with_state(state.clone(), require_customer)),
        )
        .route(
            "/:locale/owner/dashboard",
            get(owner_dashboard_handler).layer(from_fn_with_state(state.clone(), require_owner)),
        )
        .route(
            "/:locale/admin",
            get(admin_dashboard_handler).layer(from_fn_with_state(state.clone(), require_admin)),
        )
        .route(
            "/:locale/account",
            get(account_handler).layer(from_fn_with_state(state.clone(), require_auth)),
        )
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
