//! Thread expansion nested inside a history crawl
//!
//! Every history page is scanned for thread parents; each parent's replies are
//! fetched to completion and appended beside the history as `reply_<ts>`.
//! Replies are part of the enclosing checkpoint and have no marker of their own.

use crate::client::{fetch_all, ApiRequest, Page};
use crate::crawler::records::Message;
use crate::crawler::ExportSession;
use crate::store::{ObjectName, WriteOptions};
use crate::Result;
use tracing::{debug, warn};

/// Timestamps of the thread parents on a history page, in page order
pub fn thread_parents(page: &Page) -> Vec<String> {
    page.items("messages")
        .iter()
        .filter_map(|raw| match serde_json::from_value::<Message>(raw.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Skipping unreadable message: {}", e);
                None
            }
        })
        .filter(Message::is_thread_parent)
        .filter_map(|message| message.ts)
        .collect()
}

impl ExportSession {
    /// Fetches every reply page of one thread into `<scope>/reply_<ts>`
    ///
    /// # Returns
    ///
    /// The number of reply pages written
    pub(crate) async fn expand_thread(
        &mut self,
        channel_id: &str,
        scope: &ObjectName,
        ts: &str,
    ) -> Result<usize> {
        let request = ApiRequest::new("conversations.replies")
            .param("channel", channel_id)
            .param("ts", ts);
        let result = fetch_all(&mut self.caller, request, None).await?;

        let name = scope.child(format!("reply_{}", ts))?;
        for page in &result.pages {
            self.store.write(&name, page, WriteOptions::append_lines())?;
        }

        debug!(
            "Thread {} in {} expanded into {} pages",
            ts,
            channel_id,
            result.pages.len()
        );
        self.stats.threads_expanded += 1;
        self.stats.pages_written += result.pages.len() as u64;
        Ok(result.pages.len())
    }
}
