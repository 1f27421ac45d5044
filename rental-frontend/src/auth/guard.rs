//! Route guard policy.
//!
//! `decide` is a pure function over the session and the guard kind; the
//! navigation side effect lives with the caller (the guard middleware).

use crate::auth::paths::{dashboard_path, login_path, Locale};
use crate::auth::session::Session;
use crate::models::user::{Role, User};

/// What a route requires from the session.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardKind {
    /// Only reachable while anonymous (login, registration).
    Guest,
    /// Any authenticated user.
    Auth,
    /// An authenticated user whose role is in the allowed set.
    Role(Vec<Role>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    /// The session is still hydrating; no verdict may be trusted yet.
    Pending,
    Allow,
    /// Unauthorized. The caller navigates to the target, replacing the
    /// current navigation rather than stacking a history entry.
    Redirect(String),
}

impl GuardDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

fn authenticated_user(session: &Session) -> Option<&User> {
    session.user.as_ref().filter(|_| session.is_authenticated)
}

pub fn decide(session: &Session, guard: &GuardKind, locale: &Locale) -> GuardDecision {
    if session.is_loading {
        return GuardDecision::Pending;
    }

    match guard {
        GuardKind::Guest => match authenticated_user(session) {
            Some(user) => GuardDecision::Redirect(dashboard_path(user.role, locale)),
            None => GuardDecision::Allow,
        },
        GuardKind::Auth => {
            if session.is_authenticated {
                GuardDecision::Allow
            } else {
                GuardDecision::Redirect(login_path(locale))
            }
        }
        GuardKind::Role(allowed) => match authenticated_user(session) {
            None => GuardDecision::Redirect(login_path(locale)),
            Some(user) if allowed.contains(&user.role) => GuardDecision::Allow,
            // Wrong role: send the user to their own dashboard, never to
            // login, or a signed-in user would bounce in a redirect loop.
            Some(user) => GuardDecision::Redirect(dashboard_path(user.role, locale)),
        },
    }
}
