//! src/config.rs
//! ============================================================================
//! # Config: assistant configuration loader and saver
//!
//! Loads and saves settings as TOML from the platform config directory
//! using the [`directories`](https://docs.rs/directories) crate.
//!
//! ## Features
//! - XDG-compliant config discovery and writing (Linux, macOS, Windows)
//! - Defaults for every missing section or field
//! - Async load/save for smooth integration with Tokio
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! config.save().await?;
//! ```

use std::{path::PathBuf, time::Duration};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs as TokioFs;
use tracing::info;

use crate::{error::AppError, model::DateRange, util::debounce::DebounceConfig};

/// Search pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before a query is dispatched.
    #[serde(with = "humantime_serde")]
    pub debounce: Duration,

    /// Query the admin provider when the user also holds admin access.
    pub admin_search: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DebounceConfig::search_input().delay,
            admin_search: true,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn debounce_config(&self) -> DebounceConfig {
        DebounceConfig::with_delay(self.debounce)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HoldingsConfig {
    /// Range passed to the holdings provider on activation.
    pub range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,

    #[default]
    Daily,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: PathBuf,
    pub file_prefix: String,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("./logs"),
            file_prefix: "palette".to_string(),
            rotation: LogRotation::Daily,
        }
    }
}

/// Main configuration struct for the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,

    pub holdings: HoldingsConfig,

    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads config from the app config dir, writing defaults if absent.
    pub async fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            info!("Loading config from {}", path.display());
            let text = TokioFs::read_to_string(&path)
                .await
                .map_err(|source| AppError::ConfigIo {
                    path: path.clone(),
                    source,
                })?;

            Ok(Self::from_toml_str(&text)?)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save_to(&path).await?;

            Ok(default_config)
        }
    }

    /// Saves config to the app config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?).await
    }

    pub async fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(path, toml_str).await?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "palette", "Palette")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }
}
