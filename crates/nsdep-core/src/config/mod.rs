//! Policy configuration: provider trait, states, and the TOML file format.
//!
//! # Architecture
//!
//! ```text
//! nsdep.toml (+ inherited parent policies)
//!   ↓ serde (DTO layer)
//! dto::PolicyFileDto, merged with PolicyFileDto::overlay
//!   ↓ loader::load(): validate + convert
//! AnalyzerConfig (pure domain model)
//!   ↓ wrapped by a ConfigProvider
//! ConfigStatus::Enabled(Arc<AnalyzerConfig>)
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::model::{AnalyzerConfig, ModelError};

pub mod dto;
mod file;
pub mod loader;

pub use file::{FileConfigProvider, CONFIG_FILE_NAMES};

/// Coarse state of a policy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigState {
    /// No policy was found.
    NoConfig,
    /// A policy was found but could not be loaded.
    ConfigError,
    /// A policy was found and explicitly switches analysis off.
    Disabled,
    /// A usable policy is loaded.
    Enabled,
}

impl fmt::Display for ConfigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConfig => write!(f, "no-config"),
            Self::ConfigError => write!(f, "config-error"),
            Self::Disabled => write!(f, "disabled"),
            Self::Enabled => write!(f, "enabled"),
        }
    }
}

/// What a [`ConfigProvider`] currently offers.
///
/// Only `Enabled` carries a snapshot; only `ConfigError` carries a cause.
#[derive(Debug, Clone)]
pub enum ConfigStatus {
    /// No policy was found.
    NoConfig,
    /// Loading failed with the attached cause.
    ConfigError(Arc<ConfigError>),
    /// Analysis is switched off.
    Disabled,
    /// A usable snapshot.
    Enabled(Arc<AnalyzerConfig>),
}

impl ConfigStatus {
    /// Wraps a finished snapshot.
    #[must_use]
    pub fn enabled(config: AnalyzerConfig) -> Self {
        Self::Enabled(Arc::new(config))
    }

    /// Projects the status onto its [`ConfigState`].
    #[must_use]
    pub fn state(&self) -> ConfigState {
        match self {
            Self::NoConfig => ConfigState::NoConfig,
            Self::ConfigError(_) => ConfigState::ConfigError,
            Self::Disabled => ConfigState::Disabled,
            Self::Enabled(_) => ConfigState::Enabled,
        }
    }

    /// Returns the snapshot when enabled.
    #[must_use]
    pub fn config(&self) -> Option<&Arc<AnalyzerConfig>> {
        match self {
            Self::Enabled(config) => Some(config),
            _ => None,
        }
    }

    /// Returns the load failure when in error.
    #[must_use]
    pub fn error(&self) -> Option<&Arc<ConfigError>> {
        match self {
            Self::ConfigError(err) => Some(err),
            _ => None,
        }
    }
}

/// Source of policy snapshots for an analyzer.
///
/// Called once when an analyzer is built and again on every
/// `refresh_config`. Implementations decide whether anything is re-read.
pub trait ConfigProvider: Send + Sync {
    /// Returns the current policy status.
    fn status(&self) -> ConfigStatus;
}

/// A provider that always reports the same status.
#[derive(Debug, Clone)]
pub struct StaticConfigProvider {
    status: ConfigStatus,
}

impl StaticConfigProvider {
    /// Creates a provider reporting the given status.
    #[must_use]
    pub fn new(status: ConfigStatus) -> Self {
        Self { status }
    }

    /// Creates an enabled provider for a snapshot.
    #[must_use]
    pub fn enabled(config: impl Into<Arc<AnalyzerConfig>>) -> Self {
        Self::new(ConfigStatus::Enabled(config.into()))
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn status(&self) -> ConfigStatus {
        self.status.clone()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the policy file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The policy file is not valid TOML for the expected schema.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A value failed domain validation.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "allow[0].from").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: error, warning, info")]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// A policy file in an inheritance chain is invalid.
    #[error("{path}: {source}")]
    InFile {
        /// The offending policy file.
        path: PathBuf,
        /// What is wrong with it.
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Attaches the policy file the error came from.
    #[must_use]
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            // IO errors already name their path
            Self::Io { .. } | Self::InFile { .. } => self,
            other => Self::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_projects_state() {
        assert_eq!(ConfigStatus::NoConfig.state(), ConfigState::NoConfig);
        assert_eq!(ConfigStatus::Disabled.state(), ConfigState::Disabled);
        let err = ConfigStatus::ConfigError(Arc::new(ConfigError::Parse {
            message: "bad".into(),
        }));
        assert_eq!(err.state(), ConfigState::ConfigError);
        assert!(err.error().is_some());
        assert!(err.config().is_none());

        let enabled = ConfigStatus::enabled(AnalyzerConfig::builder().build());
        assert_eq!(enabled.state(), ConfigState::Enabled);
        assert!(enabled.config().is_some());
    }

    #[test]
    fn static_provider_returns_same_snapshot() {
        let provider = StaticConfigProvider::enabled(AnalyzerConfig::builder().build());
        let a = provider.status();
        let b = provider.status();
        assert!(Arc::ptr_eq(a.config().unwrap(), b.config().unwrap()));
    }
}
