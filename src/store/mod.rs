//! Storage module for persisting exported data
//!
//! This module owns the on-disk archive layout:
//! - Validated object names that map onto a directory hierarchy
//! - JSON documents and append-only line files
//! - Zero-byte done markers used by crawl checkpoints

mod name;
mod object_store;

pub use name::{sanitize_segment, validate_segment, ObjectName};
pub use object_store::{dated_directory_name, Format, ObjectStore, WriteOptions, DONE_MARKER};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid object name: {0}")]
    InvalidName(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
