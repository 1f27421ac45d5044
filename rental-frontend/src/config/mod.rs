use rental_core::error::AppError;
use secrecy::Secret;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth_service: AuthServiceSettings,
    pub session: SessionSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub session_secret: Secret<String>,
}

#[derive(Deserialize, Clone)]
pub struct AuthServiceSettings {
    /// Internal URL the portal calls (e.g. http://auth-service:9005).
    pub url: String,
    /// URL accessible from the browser (password reset links and the like).
    pub public_url: String,
}

#[derive(Deserialize, Clone)]
pub struct SessionSettings {
    /// Keep a cached session as authenticated-but-unverified when the Auth
    /// API is unreachable, instead of forcing logout. Explicit token
    /// rejections are unaffected.
    #[serde(default)]
    pub offline_grace: bool,
    #[serde(default = "default_inactivity_expiry_hours")]
    pub inactivity_expiry_hours: i64,
}

fn default_inactivity_expiry_hours() -> i64 {
    24
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    // Check if we're already in rental-frontend directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("rental-frontend") {
        base_path.join("config")
    } else {
        base_path.join("rental-frontend").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}
