//! Run statistics collected during an export
//!
//! This module provides the counters the crawl updates as it goes and the
//! end-of-run summary printed by the binary.

use crate::client::CallStats;
use crate::state::CheckpointState;

/// A remote resource that could not be exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResource {
    /// What was being fetched (channel id, file path, emoji name)
    pub resource: String,

    /// Why it failed
    pub reason: String,
}

/// Export statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Checkpoints crawled to completion in this run
    pub checkpoints_completed: u64,

    /// Checkpoints already done and skipped
    pub checkpoints_skipped: u64,

    /// Partial checkpoints discarded and crawled again
    pub checkpoints_restarted: u64,

    /// Raw pages appended to the archive
    pub pages_written: u64,

    /// Threads whose replies were fetched
    pub threads_expanded: u64,

    /// Files and emoji images saved
    pub files_downloaded: u64,

    /// Downloads skipped because the target already existed
    pub files_skipped: u64,

    /// Resources skipped after a non-transient failure
    pub failed_resources: Vec<FailedResource>,

    /// Curated channel names that do not exist in the workspace
    pub unknown_channels: Vec<String>,

    /// Phases that did not run, with the reason
    pub skipped_phases: Vec<String>,
}

impl ExportStats {
    /// Records the outcome of one checkpoint, given the state found before it ran
    pub fn record_checkpoint(&mut self, before: CheckpointState) {
        match before {
            CheckpointState::Done => self.checkpoints_skipped += 1,
            CheckpointState::Partial => {
                self.checkpoints_restarted += 1;
                self.checkpoints_completed += 1;
            }
            CheckpointState::NotStarted => self.checkpoints_completed += 1,
        }
    }

    pub fn record_failure(&mut self, resource: impl Into<String>, reason: impl Into<String>) {
        self.failed_resources.push(FailedResource {
            resource: resource.into(),
            reason: reason.into(),
        });
    }

    /// Returns true if anything was left out of the archive
    pub fn has_problems(&self) -> bool {
        !self.failed_resources.is_empty()
            || !self.unknown_channels.is_empty()
            || !self.skipped_phases.is_empty()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The export counters
/// * `calls` - Remote traffic counters from the API caller
pub fn print_statistics(stats: &ExportStats, calls: &CallStats) {
    println!("=== Export Statistics ===\n");

    println!("Remote Calls:");
    println!("  API calls: {}", calls.calls);
    println!("  Attempts (including retries): {}", calls.attempts);
    println!("  Downloads: {}", calls.downloads);
    println!();

    println!("Checkpoints:");
    println!("  Completed: {}", stats.checkpoints_completed);
    println!("  Already done: {}", stats.checkpoints_skipped);
    println!("  Restarted after interruption: {}", stats.checkpoints_restarted);
    println!();

    println!("Content:");
    println!("  Pages written: {}", stats.pages_written);
    println!("  Threads expanded: {}", stats.threads_expanded);
    println!("  Files downloaded: {}", stats.files_downloaded);
    println!("  Files already present: {}", stats.files_skipped);
    println!();

    if !stats.skipped_phases.is_empty() {
        println!("Skipped Phases:");
        for phase in &stats.skipped_phases {
            println!("  {}", phase);
        }
        println!();
    }

    if !stats.unknown_channels.is_empty() {
        println!("Unknown Channels ({}):", stats.unknown_channels.len());
        for name in &stats.unknown_channels {
            println!("  {}", name);
        }
        println!();
    }

    if !stats.failed_resources.is_empty() {
        println!("Failed Resources ({}):", stats.failed_resources.len());
        for failure in &stats.failed_resources {
            println!("  {}: {}", failure.resource, failure.reason);
        }
        println!();
    }
}
