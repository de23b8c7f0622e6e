//! Crawler module for exporting a workspace
//!
//! This module contains the export logic, including:
//! - The export session owning the caller, the store, and cached directory data
//! - Checkpointed history and files crawls with thread expansion
//! - The export phases and their ordering

mod conversation;
mod files;
mod phases;
pub mod records;
mod session;
mod threads;

pub use conversation::{ConversationOutcome, CrawlKind, FILES_DIR};
pub use phases::emoji_file_name;
pub use records::{Channel, Message, Profile, SlackFile, User};
pub use session::{ExportSession, CONVERSATION_TYPES};
pub use threads::thread_parents;

use crate::config::OutputConfig;
use crate::Result;
use tracing::info;

/// Which optional phases a run performs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Export the channels named in the curated list
    pub channels: bool,

    /// Export direct and group messages
    pub private: bool,

    /// Stop after the emoji phase
    pub only_emojis: bool,
}

/// Runs a complete export
///
/// This is the main entry point for an export. It will:
/// 1. Save custom emoji
/// 2. Load or fetch channels and users and write the derived maps
/// 3. Export conversation members
/// 4. Write the channel template
/// 5. Export curated channels and private conversations when selected
///
/// # Arguments
///
/// * `session` - The export session
/// * `output` - Locations of the channel template and curated list
/// * `options` - Phase selection
pub async fn run_export(
    session: &mut ExportSession,
    output: &OutputConfig,
    options: ExportOptions,
) -> Result<()> {
    session.export_emojis().await?;
    if options.only_emojis {
        info!("Only exporting emojis, done");
        return Ok(());
    }

    session.export_directory().await?;
    session.export_members().await?;
    session.export_channel_template(&output.template_file).await?;

    if options.channels {
        session.export_channel_messages(output).await?;
    }

    if options.private {
        session.export_private_messages().await?;
    }

    info!(
        "Export finished in {}",
        session.store().base_dir().display()
    );
    Ok(())
}
