//! src/logging.rs
//! ============================================================================
//! # Logging: tracing subscriber setup
//!
//! Installs a global subscriber that writes JSON lines to a rolling file
//! through a non-blocking `tracing_appender` writer. The returned
//! `WorkerGuard` must be kept alive for the lifetime of the process so
//! buffered lines are flushed on exit.

use std::{
    path::Path,
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Result};
use tokio::fs as TokioFs;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer, filter::Directive, fmt::time::ChronoUtc, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LogRotation, LoggingConfig};

const MAX_LOG_FILES: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid log directory: {0}")]
    InvalidLogDirectory(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);

// Logger builder
pub struct LoggerBuilder {
    config: LoggingConfig,
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: LoggingConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: LoggingConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Result<WorkerGuard> {
        if INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(LoggingError::AlreadyInitialized.into());
        }

        match self.install().await {
            Ok(guard) => Ok(guard),
            Err(e) => {
                INITIALIZED.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn install(&self) -> Result<WorkerGuard> {
        let config = &self.config;
        validate_log_directory(&config.dir)?;
        setup_log_directory(&config.dir).await?;

        let rotation = match config.rotation {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Daily => Rotation::DAILY,
        };

        let file_appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(config.file_prefix.as_str())
            .filename_suffix("jsonl")
            .max_log_files(MAX_LOG_FILES)
            .build(&config.dir)
            .context("Failed to create file appender")?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let filter = EnvFilter::from_default_env().add_directive(
            Directive::from_str(&config.level).context("Invalid log level in config")?,
        );

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_target(true)
            .with_writer(non_blocking)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(json_layer)
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        Ok(guard)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_log_directory(path: &Path) -> Result<()> {
    if path.components().count() == 0 {
        return Err(LoggingError::InvalidLogDirectory("Empty path".to_string()).into());
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(LoggingError::InvalidLogDirectory(
                "Path contains parent directory references".to_string(),
            )
            .into());
        }
    }

    Ok(())
}

async fn setup_log_directory(log_dir: &Path) -> Result<()> {
    if !log_dir.exists() {
        TokioFs::create_dir_all(log_dir)
            .await
            .map_err(LoggingError::from)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }
    Ok(())
}
