//! Typed views of the records the crawler makes decisions on
//!
//! Only the fields the exporter reads are named; every other field is kept in
//! `extra` so a record serializes back to the same JSON object it came from.

use crate::ArchiveError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A conversation: public or private channel, multi-party or direct message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,

    /// Absent for direct messages and multi-party direct messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_members: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Channel {
    /// The channel name; an empty name counts as no name
    pub fn named(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// The channel name, or its id for nameless conversations
    pub fn display_name(&self) -> &str {
        self.named().unwrap_or(&self.id)
    }

    /// Conversations known to have zero members are not worth a members call
    pub fn has_members(&self) -> bool {
        self.num_members != Some(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A workspace member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn real_name(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.real_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Display name, falling back to the real name and then the id
    pub fn nickname(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.display_name.as_deref())
            .filter(|name| !name.is_empty())
            .or_else(|| self.real_name())
            .unwrap_or(&self.id)
    }
}

/// A message from a history or replies page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,

    #[serde(default)]
    pub reply_count: u64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// True for the first message of a thread that has replies
    ///
    /// Replies carry the parent's `thread_ts` with their own `ts`, so only the
    /// parent has both equal.
    pub fn is_thread_parent(&self) -> bool {
        if self.reply_count == 0 {
            return false;
        }
        match (&self.ts, &self.thread_ts) {
            (Some(ts), Some(thread_ts)) => ts == thread_ts,
            _ => false,
        }
    }
}

/// A shared file listed by `files.list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackFile {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_private: Option<String>,

    /// PDF rendition of documents Slack converts server-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_pdf: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SlackFile {
    /// Local file name: `(<id>) <name>`
    pub fn local_name(&self) -> String {
        format!("({}) {}", self.id, self.name.as_deref().unwrap_or(&self.id))
    }
}

/// Deserializes a list of raw records returned by `source`
pub fn parse_records<T: DeserializeOwned>(
    values: &[Value],
    source: &str,
) -> Result<Vec<T>, ArchiveError> {
    values
        .iter()
        .map(|value| {
            T::deserialize(value).map_err(|e| ArchiveError::UnexpectedResponse {
                method: source.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}
