//! Export session: the explicit context every phase runs in
//!
//! The session owns the rate-limited API caller, the dated object store, and the
//! lazily populated workspace directory (channels, users, and the maps derived
//! from them). Each directory object is loaded from the archive when a previous
//! run already fetched it, and fetched from the API otherwise.

use crate::client::{fetch_all, ApiCaller, ApiRequest, CallStats};
use crate::crawler::records::{parse_records, Channel, User};
use crate::output::ExportStats;
use crate::store::{ObjectName, ObjectStore, WriteOptions};
use crate::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

/// Conversation types requested from `conversations.list`
pub const CONVERSATION_TYPES: &str = "public_channel,private_channel,mpim,im";

/// State shared by all export phases of one run
pub struct ExportSession {
    pub(crate) caller: ApiCaller,
    pub(crate) store: ObjectStore,
    pub(crate) stats: ExportStats,
    channels: Option<Vec<Channel>>,
    users: Option<Vec<User>>,
    channel_map: Option<BTreeMap<String, Channel>>,
    channel_name_map: Option<BTreeMap<String, Channel>>,
    user_id_map: Option<BTreeMap<String, User>>,
    user_nickname_map: Option<BTreeMap<String, String>>,
}

impl ExportSession {
    pub fn new(caller: ApiCaller, store: ObjectStore) -> Self {
        Self {
            caller,
            store,
            stats: ExportStats::default(),
            channels: None,
            users: None,
            channel_map: None,
            channel_name_map: None,
            user_id_map: None,
            user_nickname_map: None,
        }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn stats(&self) -> &ExportStats {
        &self.stats
    }

    pub fn call_stats(&self) -> CallStats {
        self.caller.stats()
    }

    /// Every conversation visible to the token
    pub async fn channels(&mut self) -> Result<&[Channel]> {
        if self.channels.is_none() {
            let channels = self.load_or_fetch_channels().await?;
            self.channels = Some(channels);
        }
        Ok(self.channels.as_deref().unwrap_or_default())
    }

    /// Every workspace member
    pub async fn users(&mut self) -> Result<&[User]> {
        if self.users.is_none() {
            let users = self.load_or_fetch_users().await?;
            self.users = Some(users);
        }
        Ok(self.users.as_deref().unwrap_or_default())
    }

    /// Conversations keyed by id
    pub async fn channel_map(&mut self) -> Result<&BTreeMap<String, Channel>> {
        if self.channel_map.is_none() {
            let map: BTreeMap<String, Channel> = self
                .channels()
                .await?
                .iter()
                .map(|channel| (channel.id.clone(), channel.clone()))
                .collect();
            self.store.write(
                &ObjectName::new("channel_map")?,
                &map,
                WriteOptions::json(),
            )?;
            self.channel_map = Some(map);
        }
        Ok(self.channel_map.get_or_insert_with(BTreeMap::new))
    }

    /// Named conversations keyed by name
    pub async fn channel_name_map(&mut self) -> Result<&BTreeMap<String, Channel>> {
        if self.channel_name_map.is_none() {
            let map: BTreeMap<String, Channel> = self
                .channels()
                .await?
                .iter()
                .filter_map(|channel| {
                    channel
                        .named()
                        .map(|name| (name.to_string(), channel.clone()))
                })
                .collect();
            self.store.write(
                &ObjectName::new("channel_name_map")?,
                &map,
                WriteOptions::json(),
            )?;
            self.channel_name_map = Some(map);
        }
        Ok(self.channel_name_map.get_or_insert_with(BTreeMap::new))
    }

    /// Users keyed by id
    pub async fn user_id_map(&mut self) -> Result<&BTreeMap<String, User>> {
        if self.user_id_map.is_none() {
            let map: BTreeMap<String, User> = self
                .users()
                .await?
                .iter()
                .map(|user| (user.id.clone(), user.clone()))
                .collect();
            self.store.write(
                &ObjectName::new("user_id_map")?,
                &map,
                WriteOptions::pretty_json(),
            )?;
            self.user_id_map = Some(map);
        }
        Ok(self.user_id_map.get_or_insert_with(BTreeMap::new))
    }

    /// User ids mapped to the name people see in the client
    pub async fn user_nickname_map(&mut self) -> Result<&BTreeMap<String, String>> {
        if self.user_nickname_map.is_none() {
            let map: BTreeMap<String, String> = self
                .users()
                .await?
                .iter()
                .map(|user| (user.id.clone(), user.nickname().to_string()))
                .collect();
            self.store.write(
                &ObjectName::new("user_nickname_map")?,
                &map,
                WriteOptions::pretty_json(),
            )?;
            self.user_nickname_map = Some(map);
        }
        Ok(self.user_nickname_map.get_or_insert_with(BTreeMap::new))
    }

    async fn load_or_fetch_channels(&mut self) -> Result<Vec<Channel>> {
        let name = ObjectName::new("channels")?;
        let raw = match self.store.load_json(&name)? {
            Some(Value::Array(items)) if !items.is_empty() => {
                info!("Loaded {} channels from the archive", items.len());
                items
            }
            _ => {
                info!("Fetching channels");
                let request =
                    ApiRequest::new("conversations.list").param("types", CONVERSATION_TYPES);
                let result = fetch_all(&mut self.caller, request, Some("channels")).await?;
                self.store.write(&name, &result.items, WriteOptions::json())?;
                self.store.write(
                    &ObjectName::new("channels_calls")?,
                    &result.pages,
                    WriteOptions::json(),
                )?;
                result.items
            }
        };
        parse_records(&raw, "conversations.list")
    }

    async fn load_or_fetch_users(&mut self) -> Result<Vec<User>> {
        let name = ObjectName::new("users")?;
        let raw = match self.store.load_json(&name)? {
            Some(Value::Array(items)) if !items.is_empty() => {
                info!("Loaded {} users from the archive", items.len());
                items
            }
            _ => {
                info!("Fetching users");
                let result =
                    fetch_all(&mut self.caller, ApiRequest::new("users.list"), Some("members"))
                        .await?;
                self.store
                    .write(&name, &result.items, WriteOptions::pretty_json())?;
                self.store.write(
                    &ObjectName::new("users_calls")?,
                    &result.pages,
                    WriteOptions::json(),
                )?;
                result.items
            }
        };
        parse_records(&raw, "users.list")
    }
}
