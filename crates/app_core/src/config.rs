//! Application configuration

use crate::{AppError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub logview: LogViewConfig,
}

/// Where the application writes its logs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// A log file; its parent directory becomes the browsed base
    pub file: Option<PathBuf>,
    /// A log directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogViewConfig {
    /// Explicit base directory, used when no logging location is set
    pub path: Option<PathBuf>,
    /// Stylesheet URLs handed to the listing page
    pub stylesheets: Vec<String>,
}

impl Default for LogViewConfig {
    fn default() -> Self {
        Self {
            path: None,
            stylesheets: vec![
                "https://maxcdn.bootstrapcdn.com/bootstrap/3.3.2/css/bootstrap.min.css".to_string(),
                "https://maxcdn.bootstrapcdn.com/font-awesome/4.3.0/css/font-awesome.min.css"
                    .to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "LogView", "LogView")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// The directory to browse: the parent of `logging.file`, else
    /// `logging.path`, else `logview.path`
    pub fn base_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.logging.file {
            let absolute = if file.is_absolute() {
                file.clone()
            } else {
                std::env::current_dir()?.join(file)
            };
            return absolute
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    AppError::Config(format!("{} has no parent directory", file.display()))
                });
        }

        self.logging
            .path
            .clone()
            .or_else(|| self.logview.path.clone())
            .ok_or_else(|| {
                AppError::Config(
                    "no log directory configured (logging.file, logging.path or logview.path)"
                        .into(),
                )
            })
    }
}
