//! Checkpointed conversation crawls
//!
//! A conversation export consists of two checkpoints: the message history at
//! `<scope>` and the shared files at `<scope>/files`. Each one is driven through
//! the same state machine:
//!
//! - `Done`: skipped, nothing is fetched
//! - `Partial`: the directory is removed and the crawl starts over
//! - `NotStarted`: pages are fetched and persisted one at a time, then the
//!   done marker is written
//!
//! The marker is written only after every page of the checkpoint is on disk, so an
//! interruption at any point leaves a `Partial` checkpoint for the next run.

use crate::client::{ApiRequest, Pager};
use crate::crawler::records::Channel;
use crate::crawler::threads::thread_parents;
use crate::crawler::ExportSession;
use crate::state::CheckpointState;
use crate::store::{ObjectName, WriteOptions};
use crate::Result;
use std::fmt;
use tracing::{debug, info};

/// Directory of the files checkpoint inside a conversation scope
pub const FILES_DIR: &str = "files";

/// What a checkpoint crawls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlKind {
    /// `conversations.history` with thread expansion
    History,

    /// `files.list` with downloads
    Files,
}

impl fmt::Display for CrawlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::History => write!(f, "history"),
            Self::Files => write!(f, "files"),
        }
    }
}

/// States found before each checkpoint of one conversation ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationOutcome {
    pub history: CheckpointState,
    pub files: CheckpointState,
}

impl ExportSession {
    /// Exports the history and then the files of `channel` into `scope`
    pub async fn export_conversation(
        &mut self,
        channel: &Channel,
        scope: &ObjectName,
    ) -> Result<ConversationOutcome> {
        let history = self.run_checkpoint(channel, scope, CrawlKind::History).await?;

        let files_scope = scope.child(FILES_DIR)?;
        let files = self
            .run_checkpoint(channel, &files_scope, CrawlKind::Files)
            .await?;

        Ok(ConversationOutcome { history, files })
    }

    /// Drives one checkpoint through its state machine
    ///
    /// # Returns
    ///
    /// The state the checkpoint was in before this call
    pub async fn run_checkpoint(
        &mut self,
        channel: &Channel,
        scope: &ObjectName,
        kind: CrawlKind,
    ) -> Result<CheckpointState> {
        let state = CheckpointState::detect(&self.store, scope);

        if !state.needs_crawl() {
            info!("Already done, skipping {} of {}", kind, scope);
            self.stats.record_checkpoint(state);
            return Ok(state);
        }

        if state.needs_cleanup() {
            info!(
                "Partial {} exists, removing {}",
                kind,
                self.store.dir_of(scope).display()
            );
            self.store.remove_tree(scope)?;
        }

        info!("Getting {} for {}", kind, channel.display_name());
        match kind {
            CrawlKind::History => self.crawl_history(channel, scope).await?,
            CrawlKind::Files => self.crawl_files(channel, scope).await?,
        }

        self.store.write_marker(scope)?;
        self.stats.record_checkpoint(state);
        Ok(state)
    }

    async fn crawl_history(&mut self, channel: &Channel, scope: &ObjectName) -> Result<()> {
        let pages_name = scope.child(channel.id.as_str())?;
        let request = ApiRequest::new("conversations.history").param("channel", channel.id.as_str());
        let mut pager = Pager::new(request);

        while let Some(page) = pager.next_page(&mut self.caller).await? {
            self.store
                .write(&pages_name, page.data(), WriteOptions::append_lines())?;
            self.stats.pages_written += 1;

            for ts in thread_parents(&page) {
                self.expand_thread(&channel.id, scope, &ts).await?;
            }

            debug!(
                "Number of history calls for {}: {}",
                channel.display_name(),
                pager.pages_fetched()
            );
        }

        Ok(())
    }
}
