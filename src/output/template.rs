//! Curated channel list files
//!
//! The exporter writes a template listing every channel name; the user copies it,
//! prunes it, and the channel phase reads the pruned copy back.

use crate::{ArchiveError, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Writes `names` as a pretty JSON array to `path`
pub fn write_channel_template(path: &Path, names: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    names
        .serialize(&mut serializer)
        .map_err(|e| ArchiveError::InvalidInput {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    fs::write(path, buffer)?;
    Ok(())
}

/// Reads a curated JSON array of channel names
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The names in file order
/// * `Err(ArchiveError::MissingInput)` - The file does not exist
/// * `Err(ArchiveError::InvalidInput)` - The file is not an array of strings
pub fn read_channel_list(path: &Path) -> Result<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ArchiveError::MissingInput {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let invalid = |message: String| ArchiveError::InvalidInput {
        path: path.to_path_buf(),
        message,
    };

    let value: Value = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(invalid("expected a JSON array of channel names".to_string()));
    };

    entries
        .into_iter()
        .map(|entry| match entry {
            Value::String(name) => Ok(name),
            other => Err(invalid(format!("expected a channel name, found {}", other))),
        })
        .collect()
}

/// Explains how to produce the curated list from the template
pub fn curated_list_guidance(channels_file: &Path, template_file: &Path) -> String {
    format!(
        "Create '{}' holding a JSON array of the channel names to export. \
         Copy '{}', remove the channels you do not want, then run the export again.",
        channels_file.display(),
        template_file.display()
    )
}
