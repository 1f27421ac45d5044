use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::auth::paths::{login_path, Locale};

/// Marketplace role, as the Auth API reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    VehicleOwner,
    Admin,
    /// A role this portal release does not know. Routing treats it as a
    /// customer; it is never written back as anything but its wire tag.
    Unknown,
}

impl Role {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "CUSTOMER" => Role::Customer,
            "VEHICLE_OWNER" => Role::VehicleOwner,
            "ADMIN" => Role::Admin,
            _ => Role::Unknown,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::VehicleOwner => "VEHICLE_OWNER",
            Role::Admin => "ADMIN",
            Role::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::VehicleOwner => "Vehicle owner",
            Role::Admin => "Administrator",
            Role::Unknown => "Customer",
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Role::from_wire(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn initials(&self) -> String {
        let mut initials = String::new();
        for part in [&self.first_name, &self.last_name] {
            if let Some(c) = part.chars().next() {
                initials.extend(c.to_uppercase());
            }
        }
        if initials.is_empty() {
            initials.push('U');
        }
        initials
    }
}

/// Authenticated user context injected into request extensions by the guard
/// layer once a route's guard has resolved to an authorized verdict.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            Some(current) => Ok(current.clone()),
            // A protected handler mounted without its guard layer never
            // renders; it falls back to the login redirect.
            None => {
                let locale = Locale::from_path(parts.uri.path());
                Err(Redirect::to(&login_path(&locale)).into_response())
            }
        }
    }
}
