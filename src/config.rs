use crate::error::AppError;
use media_gallery::GalleryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, read from a TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: Option<u16>,
    pub secure: bool,
    /// Overrides the base derived from host, port and secure
    pub external_base: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: Some(8080),
            secure: true,
            external_base: None,
        }
    }
}

impl ServerConfig {
    /// Base prepended to relative media URLs, e.g. `https://127.0.0.1:8080`
    pub fn external_base(&self) -> String {
        if let Some(base) = &self.external_base {
            return base.trim_end_matches('/').to_string();
        }
        let protocol = if self.secure { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{}://{}:{}", protocol, self.host, port),
            None => format!("{}://{}", protocol, self.host),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./data/photoshare.db".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}

impl AppConfig {
    pub fn from_toml(s: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads the configuration file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
