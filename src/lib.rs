//! Slack-Archiver: a resumable exporter for Slack workspaces
//!
//! This crate crawls the paginated Slack Web API under a sliding-window rate limit,
//! persists every page to a dated on-disk archive, and checkpoints each conversation
//! so that an interrupted export can be rerun without repeating finished work.

pub mod client;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("API error: {0}")]
    Api(#[from] client::ApiError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Required input file is missing: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Malformed input in {}: {message}", path.display())]
    InvalidInput { path: PathBuf, message: String },

    #[error("Unexpected response from {method}: {message}")]
    UnexpectedResponse { method: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable '{0}' must be set to a Slack token")]
    MissingCredential(String),
}

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::{ApiCaller, ApiError, ErrorKind, RateLimiter, SlackApi, SlackHttpClient};
pub use config::Config;
pub use crawler::ExportSession;
pub use state::CheckpointState;
pub use store::{ObjectName, ObjectStore};
