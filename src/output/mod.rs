//! Output module for run reporting and user-facing files
//!
//! This module handles:
//! - Counting what an export did and printing the end-of-run summary
//! - Writing the channel template and reading the curated channel list

pub mod stats;
mod template;

pub use stats::{print_statistics, ExportStats, FailedResource};
pub use template::{curated_list_guidance, read_channel_list, write_channel_template};
