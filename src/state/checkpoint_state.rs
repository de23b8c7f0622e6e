/// Checkpoint state definitions for resumable crawls
///
/// A checkpoint is a directory in the archive. Its state is derived entirely from
/// what is on disk, so it survives process restarts without a separate journal.
use crate::store::{ObjectName, ObjectStore};
use std::fmt;

/// Represents the current state of one independently checkpointed crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckpointState {
    /// Nothing has been written for this checkpoint yet
    NotStarted,

    /// The directory exists but the done marker is absent: a previous run was
    /// interrupted and its content cannot be trusted
    Partial,

    /// The done marker is present; the crawl must never be repeated
    Done,
}

impl CheckpointState {
    /// Inspects the archive to determine the state of `scope`
    pub fn detect(store: &ObjectStore, scope: &ObjectName) -> Self {
        if store.marker_exists(scope) {
            Self::Done
        } else if store.dir_exists(scope) {
            Self::Partial
        } else {
            Self::NotStarted
        }
    }

    /// Returns true if the crawl still has to run
    pub fn needs_crawl(&self) -> bool {
        !matches!(self, Self::Done)
    }

    /// Returns true if stale content has to be discarded before crawling
    pub fn needs_cleanup(&self) -> bool {
        matches!(self, Self::Partial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Partial => "partial",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CheckpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
