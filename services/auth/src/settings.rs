//! Service settings loaded with the `config` crate

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Authentication service settings
///
/// # Environment Variables
/// - `AUTH_BIND_ADDRESS`: Listen address (default: "0.0.0.0:3000")
/// - `AUTH_SUPERUSER_EMAIL` / `AUTH_SUPERUSER_PASSWORD`: When both are set, a
///   superuser with these credentials is created at start-up if missing
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    #[serde(default)]
    pub superuser_email: Option<String>,
    #[serde(default)]
    pub superuser_password: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .add_source(Environment::with_prefix("AUTH"))
            .build()?
            .try_deserialize()
    }

    /// Superuser credentials, if both halves are configured
    pub fn superuser(&self) -> Option<(&str, &str)> {
        match (&self.superuser_email, &self.superuser_password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}
