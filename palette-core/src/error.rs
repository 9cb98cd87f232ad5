//! src/error.rs
//! ============================================================================
//! # Error taxonomy for the assistant core
//!
//! `ProviderError` covers every failure a search or holdings provider can
//! report. `AppError` is the unified error used by the rest of the crate;
//! all public operations return `Result<T, AppError>`.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure reported by one of the asynchronous result providers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport level failure (connection refused, timeout, ...).
    #[error("Network failure: {0}")]
    Network(String),

    /// The provider answered but refused the request.
    #[error("Provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider answered with a payload that could not be decoded.
    #[error("Could not decode provider response: {0}")]
    Decode(String),

    #[error("Provider error: {0}")]
    Other(String),
}

/// Unified error type for all assistant operations.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Config file I/O error with path.
    #[error("Failed to read config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Fixture or payload (de)serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A write was attempted on a filter control that is currently disabled.
    #[error("Filter '{field}' is disabled")]
    FilterDisabled { field: &'static str },

    /// The requested id is not one of the options currently offered.
    #[error("Unknown option '{id}' for filter '{field}'")]
    UnknownFilterOption { field: &'static str, id: String },

    #[error("Changing the date range is not permitted")]
    DateRangeDisabled,

    /// Operation cancelled by teardown or a newer submission.
    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Other(String),
}

impl AppError {
    pub fn unknown_option<S: Into<String>>(field: &'static str, id: S) -> Self {
        Self::UnknownFilterOption {
            field,
            id: id.into(),
        }
    }

    /// Whether the error comes from a provider (network or logic failure).
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_convert_and_classify() {
        let err: AppError = ProviderError::Network("connection reset".into()).into();
        assert!(err.is_provider_failure());
        assert_eq!(err.to_string(), "Network failure: connection reset");
    }

    #[test]
    fn unknown_option_names_field_and_id() {
        let err = AppError::unknown_option("account", "acc-404");
        assert!(!err.is_provider_failure());
        assert!(matches!(
            err,
            AppError::UnknownFilterOption { field: "account", ref id } if id == "acc-404"
        ));
    }
}
