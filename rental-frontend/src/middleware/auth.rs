//! Guard layers for protected routes.
//!
//! Each layer hydrates the session for the request, runs the pure guard
//! decision, and performs the only side effect the guard owns: the redirect.
//! An authorized request carries the resolved identity forward in its
//! extensions, where the `CurrentUser` extractor picks it up.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use rental_core::error::AppError;
use tower_sessions::Session as TowerSession;

use crate::auth::{
    decide, CookieSessionStorage, GuardDecision, GuardKind, HydrationOutcome, Locale, SessionStore,
};
use crate::models::user::{CurrentUser, Role};
use crate::AppState;

pub async fn guest_guard(
    State(state): State<AppState>,
    session: TowerSession,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    apply_guard(state, session, request, next, GuardKind::Guest).await
}

pub async fn require_auth(
    State(state): State<AppState>,
    session: TowerSession,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    apply_guard(state, session, request, next, GuardKind::Auth).await
}

pub async fn require_customer(
    State(state): State<AppState>,
    session: TowerSession,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    apply_guard(state, session, request, next, GuardKind::Role(vec![Role::Customer])).await
}

pub async fn require_owner(
    State(state): State<AppState>,
    session: TowerSession,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    apply_guard(
        state,
        session,
        request,
        next,
        GuardKind::Role(vec![Role::VehicleOwner]),
    )
    .await
}

pub async fn require_admin(
    State(state): State<AppState>,
    session: TowerSession,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    apply_guard(state, session, request, next, GuardKind::Role(vec![Role::Admin])).await
}

async fn apply_guard(
    state: AppState,
    session: TowerSession,
    mut request: Request<Body>,
    next: Next,
    guard: GuardKind,
) -> Result<Response, AppError> {
    let locale = Locale::from_path(request.uri().path());

    let storage = CookieSessionStorage::new(session);
    let mut store = SessionStore::new(storage, state.session.offline_grace);

    if store.hydrate(state.auth_client.as_ref(), &state.shutdown).await
        == HydrationOutcome::Cancelled
    {
        return Err(AppError::ServiceUnavailable);
    }

    match decide(store.session(), &guard, &locale) {
        // Hydration completed above, so a pending verdict cannot escape.
        GuardDecision::Pending => Err(AppError::ServiceUnavailable),
        GuardDecision::Redirect(target) => Ok(Redirect::to(&target).into_response()),
        GuardDecision::Allow => {
            if let (Some(user), Some(token)) = (
                store.session().user.clone(),
                store.session().token.clone(),
            ) {
                request.extensions_mut().insert(CurrentUser { user, token });
            }
            Ok(next.run(request).await)
        }
    }
}
