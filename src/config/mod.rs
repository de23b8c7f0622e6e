//! Configuration module for Slack-Archiver
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: every key has a default.
//!
//! # Example
//!
//! ```no_run
//! use slack_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archiver.toml")).unwrap();
//! println!("Archives go to: {}", config.output.archive_root.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, OutputConfig, RateLimitConfig};

// Re-export parser functions
pub use parser::{load_config, load_or_default, parse_config, read_token};
