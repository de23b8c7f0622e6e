//! Shared file listing and downloads
//!
//! Downloads are keyed by their local object name: a target that already exists
//! is never fetched again, so rerunning a files crawl only fetches what is missing.

use crate::client::{ApiRequest, Pager};
use crate::crawler::records::{Channel, SlackFile};
use crate::crawler::ExportSession;
use crate::store::{sanitize_segment, Format, ObjectName, WriteOptions};
use crate::Result;
use tracing::{debug, info, warn};

impl ExportSession {
    /// Lists every file shared in `channel` and downloads each one into `scope`
    pub(crate) async fn crawl_files(&mut self, channel: &Channel, scope: &ObjectName) -> Result<()> {
        let pages_name = scope.child(channel.id.as_str())?;
        let request = ApiRequest::new("files.list").param("channel", channel.id.as_str());
        let mut pager = Pager::new(request);

        while let Some(page) = pager.next_page(&mut self.caller).await? {
            self.store
                .write(&pages_name, page.data(), WriteOptions::append_lines())?;
            self.stats.pages_written += 1;

            for raw in page.items("files") {
                match serde_json::from_value::<SlackFile>(raw.clone()) {
                    Ok(file) => self.download_file(&file, scope).await?,
                    Err(e) => warn!("Skipping unreadable file entry in {}: {}", channel.id, e),
                }
            }
        }

        Ok(())
    }

    async fn download_file(&mut self, file: &SlackFile, scope: &ObjectName) -> Result<()> {
        let local_name = file.local_name();

        if let Some(url) = &file.url_private {
            let target = scope.child(sanitize_segment(&local_name))?;
            self.download_once(url, &target).await?;
        }

        if let Some(url) = &file.converted_pdf {
            let target = scope.child(sanitize_segment(&format!("{}.pdf", local_name)))?;
            self.download_once(url, &target).await?;
        }

        Ok(())
    }

    /// Downloads `url` to `target` unless the target already exists
    ///
    /// A download rejected with a non-transient error is recorded as a failed
    /// resource and skipped; store errors abort.
    ///
    /// # Returns
    ///
    /// True if the file was fetched in this call
    pub(crate) async fn download_once(&mut self, url: &str, target: &ObjectName) -> Result<bool> {
        if self.store.exists(target, Format::Raw) {
            info!("Skipping file because it exists: {}", target);
            self.stats.files_skipped += 1;
            return Ok(false);
        }

        match self.caller.download(url).await {
            Ok(bytes) => {
                let path = self.store.write_bytes(target, &bytes)?;
                debug!("Saved {} bytes as {}", bytes.len(), path.display());
                self.stats.files_downloaded += 1;
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to download {}: {}", target, e);
                self.stats.record_failure(target.to_string(), e.to_string());
                Ok(false)
            }
        }
    }
}
