//! Export phases run by the binary
//!
//! Phases run in a fixed order (emoji, workspace directory, members, channel
//! template, channel messages, private messages). Each one is idempotent: rerunning
//! it after an interruption only fetches what the archive does not hold yet.

use crate::client::{fetch_all, ApiRequest};
use crate::config::OutputConfig;
use crate::crawler::records::Channel;
use crate::crawler::ExportSession;
use crate::output::{curated_list_guidance, read_channel_list, write_channel_template};
use crate::store::{sanitize_segment, ObjectName, WriteOptions};
use crate::{ArchiveError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};
use url::Url;

/// Emoji values of this form point at another emoji instead of an image
const EMOJI_ALIAS_PREFIX: &str = "alias:";

/// File name for a custom emoji image, keeping the extension of its URL
pub fn emoji_file_name(name: &str, url: &str) -> String {
    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => {
            sanitize_segment(&format!("{}.{}", name, ext))
        }
        _ => sanitize_segment(name),
    }
}

fn conversation_scope(kind: &str, leaf: &str) -> Result<ObjectName> {
    Ok(ObjectName::from_segments(["conversations", kind])?.child(sanitize_segment(leaf))?)
}

impl ExportSession {
    /// Saves the custom emoji list and downloads every emoji image
    pub async fn export_emojis(&mut self) -> Result<()> {
        info!("Exporting emojis");
        let page = self.caller.call(&ApiRequest::new("emoji.list")).await?;

        let dir = ObjectName::new("emojis")?;
        self.store
            .write(&dir.child("emojis")?, page.data(), WriteOptions::pretty_json())?;

        let images: BTreeMap<String, String> = page
            .data()
            .get("emoji")
            .and_then(Value::as_object)
            .map(|emoji| {
                emoji
                    .iter()
                    .filter_map(|(name, value)| {
                        value.as_str().map(|url| (name.clone(), url.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        for (name, url) in &images {
            if url.starts_with(EMOJI_ALIAS_PREFIX) || !url.starts_with("http") {
                continue;
            }
            let target = dir.child(emoji_file_name(name, url))?;
            self.download_once(url, &target).await?;
        }

        Ok(())
    }

    /// Materializes the channel and user directory objects in the archive
    pub async fn export_directory(&mut self) -> Result<()> {
        let channels = self.channels().await?.len();
        let users = self.users().await?.len();
        info!("Workspace has {} conversations and {} users", channels, users);

        self.channel_map().await?;
        self.channel_name_map().await?;
        self.user_id_map().await?;
        self.user_nickname_map().await?;
        Ok(())
    }

    /// Exports the member list of every conversation that has members
    ///
    /// # Returns
    ///
    /// Member ids keyed by conversation id, for every conversation that succeeded
    pub async fn export_members(&mut self) -> Result<BTreeMap<String, Vec<String>>> {
        let channels: Vec<Channel> = self.channels().await?.to_vec();

        let mut members_map = BTreeMap::new();
        for channel in channels.iter().filter(|c| c.has_members()) {
            if let Some(members) = self.conversation_members(&channel.id).await? {
                members_map.insert(channel.id.clone(), members);
            }
        }

        self.store.write(
            &ObjectName::new("convo_members_map")?,
            &members_map,
            WriteOptions::pretty_json(),
        )?;

        let real_names: BTreeMap<String, String> = self
            .user_id_map()
            .await?
            .iter()
            .filter_map(|(id, user)| user.real_name().map(|name| (id.clone(), name.to_string())))
            .collect();

        let names_map: BTreeMap<&String, Vec<String>> = members_map
            .iter()
            .map(|(channel_id, ids)| {
                let names = ids
                    .iter()
                    .map(|id| real_names.get(id).unwrap_or(id).clone())
                    .collect();
                (channel_id, names)
            })
            .collect();

        self.store.write(
            &ObjectName::new("convo_members_map_names")?,
            &names_map,
            WriteOptions::pretty_json(),
        )?;

        Ok(members_map)
    }

    /// Member ids of one conversation, from the archive or the API
    ///
    /// Returns `None` when the API refused the call; the failure is recorded.
    async fn conversation_members(&mut self, channel_id: &str) -> Result<Option<Vec<String>>> {
        let dir = ObjectName::new("channel_members")?;
        let name = dir.child(channel_id)?;

        if let Some(Value::Array(cached)) = self.store.load_json(&name)? {
            return Ok(Some(
                cached
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ));
        }

        info!("Getting members for {}", channel_id);
        let request = ApiRequest::new("conversations.members").param("channel", channel_id);
        let result = match fetch_all(&mut self.caller, request, Some("members")).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Failed to get members for {}: {}", channel_id, e);
                self.stats.record_failure(name.to_string(), e.to_string());
                return Ok(None);
            }
        };

        let mut members: Vec<String> = result
            .items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        members.sort();

        self.store
            .write(&name, &members, WriteOptions::pretty_json())?;
        self.store.write(
            &dir.child(format!("{}_call", channel_id))?,
            &result.pages,
            WriteOptions::json(),
        )?;

        Ok(Some(members))
    }

    /// Writes the sorted names of every named channel to `path`
    pub async fn export_channel_template(&mut self, path: &Path) -> Result<Vec<String>> {
        let names: Vec<String> = self.channel_name_map().await?.keys().cloned().collect();
        write_channel_template(path, &names)?;
        info!("Wrote {} channel names to {}", names.len(), path.display());
        Ok(names)
    }

    /// Exports every channel named in the curated list
    ///
    /// A missing or malformed list skips the phase with guidance; names that do
    /// not exist in the workspace are collected and reported.
    pub async fn export_channel_messages(&mut self, output: &OutputConfig) -> Result<()> {
        let wanted = match read_channel_list(&output.channels_file) {
            Ok(names) => names,
            Err(e @ (ArchiveError::MissingInput { .. } | ArchiveError::InvalidInput { .. })) => {
                warn!("{}", e);
                warn!(
                    "{}",
                    curated_list_guidance(&output.channels_file, &output.template_file)
                );
                self.stats
                    .skipped_phases
                    .push(format!("channel messages: {}", e));
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let name_map = self.channel_name_map().await?.clone();
        for name in wanted {
            let Some(channel) = name_map.get(&name) else {
                warn!("Channel {} does not exist in the workspace", name);
                self.stats.unknown_channels.push(name);
                continue;
            };

            info!("Working on channel {}", name);
            let scope = conversation_scope("channels", &name)?;
            self.export_or_skip(channel, &scope).await?;
        }

        Ok(())
    }

    /// Exports every conversation without a name (direct and group messages)
    pub async fn export_private_messages(&mut self) -> Result<()> {
        let private: Vec<Channel> = self
            .channel_map()
            .await?
            .values()
            .filter(|channel| channel.named().is_none())
            .cloned()
            .collect();

        info!("Exporting {} private conversations", private.len());
        for channel in &private {
            let scope = conversation_scope("private", &channel.id)?;
            self.export_or_skip(channel, &scope).await?;
        }

        Ok(())
    }

    /// Exports one conversation, recording and skipping it when the API refuses it
    ///
    /// The refused checkpoint stays `Partial` and is retried by the next run.
    /// Store errors still abort.
    async fn export_or_skip(&mut self, channel: &Channel, scope: &ObjectName) -> Result<()> {
        match self.export_conversation(channel, scope).await {
            Ok(_) => Ok(()),
            Err(ArchiveError::Api(e)) if !e.is_transient() => {
                warn!("Skipping {}: {}", channel.display_name(), e);
                self.stats.record_failure(scope.to_string(), e.to_string());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
