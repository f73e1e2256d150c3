//! Service settings loaded with the `config` crate

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;

/// API service settings
///
/// # Environment Variables
/// - `API_BIND_ADDRESS`: Listen address (default: "0.0.0.0:3001")
/// - `API_MEDIA_ROOT`: Directory uploaded images are stored under (default: "media")
/// - `API_MAX_UPLOAD_BYTES`: Largest accepted request body (default: 10 MiB)
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3001")?
            .set_default("media_root", "media")?
            .set_default("max_upload_bytes", 10 * 1024 * 1024)?
            .add_source(Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
