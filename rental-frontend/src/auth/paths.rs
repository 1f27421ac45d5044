use std::fmt;

use crate::models::user::Role;

pub const DEFAULT_LOCALE: &str = "en";
pub const SUPPORTED_LOCALES: &[&str] = &["en", "de", "fr"];

/// A supported locale tag. Construction normalizes anything unsupported to
/// the default, so every path built from a `Locale` is routable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: &str) -> Self {
        if SUPPORTED_LOCALES.contains(&tag) {
            Locale(tag.to_string())
        } else {
            Locale(DEFAULT_LOCALE.to_string())
        }
    }

    /// Locale from the first path segment, e.g. `/de/owner/dashboard` -> de.
    pub fn from_path(path: &str) -> Self {
        let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or("");
        Locale::new(first_segment)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LOCALE.to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical landing route for a role. Total over `Role`: anything the
/// portal does not recognize lands on the customer dashboard.
pub fn dashboard_path(role: Role, locale: &Locale) -> String {
    let segment = match role {
        Role::Admin => "admin",
        Role::VehicleOwner => "owner/dashboard",
        Role::Customer | Role::Unknown => "dashboard",
    };
    format!("/{}/{}", locale, segment)
}

pub fn login_path(locale: &Locale) -> String {
    format!("/{}/login", locale)
}
