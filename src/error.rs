//! Error types for the graph dashboard.
//!
//! The data layer never lets these cross a source boundary: sources log them
//! and degrade into fallback envelopes. They surface only from the loaders,
//! the CLI argument grammar, and watch-mode ticks.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by loaders, providers, the CLI grammar and watch mode.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    TomlConfig(#[from] toml::de::Error),

    #[error("entity registry not found at {}", .0.display())]
    RegistryNotFound(PathBuf),

    #[error("analysis provider is unavailable")]
    ProviderUnavailable,

    #[error("analysis provider failed: {0}")]
    Provider(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown format: {0}. Valid formats: {}", crate::export::ExportFormat::valid_names().join(", "))]
    UnknownFormat(String),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl GraphError {
    /// True for errors caused by bad command-line input (exit status 1, no retry).
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            GraphError::UnknownCommand(_) | GraphError::UnknownFormat(_)
        )
    }
}

/// Crate-wide result alias.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
