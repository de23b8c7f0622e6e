//! Filesystem-backed object store
//!
//! Objects live under a dated base directory. Structured objects are single JSON
//! documents; line objects hold one JSON record per line and are safe to append to.

use crate::store::{ObjectName, StoreError, StoreResult};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Name of the zero-byte file that marks a finished checkpoint
pub const DONE_MARKER: &str = "done";

/// Suffix of the sibling a raw object is written to before it is renamed into place
const PARTIAL_SUFFIX: &str = "part";

/// On-disk representation of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A single JSON document (`.json`), optionally indented with sorted keys
    Json { pretty: bool },

    /// One JSON record per line (`.txt`)
    Lines,

    /// Bytes written as-is, no extension
    Raw,
}

impl Format {
    pub const JSON: Format = Format::Json { pretty: false };
    pub const PRETTY_JSON: Format = Format::Json { pretty: true };

    fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Json { .. } => Some("json"),
            Self::Lines => Some("txt"),
            Self::Raw => None,
        }
    }
}

/// Options for [`ObjectStore::write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub append: bool,
    pub format: Format,
}

impl WriteOptions {
    pub fn json() -> Self {
        Self {
            append: false,
            format: Format::JSON,
        }
    }

    pub fn pretty_json() -> Self {
        Self {
            append: false,
            format: Format::PRETTY_JSON,
        }
    }

    /// Appending line records, used for raw pages accumulated during a crawl
    pub fn append_lines() -> Self {
        Self {
            append: true,
            format: Format::Lines,
        }
    }
}

/// Reads and writes named objects below one base directory
#[derive(Debug, Clone)]
pub struct ObjectStore {
    base_dir: PathBuf,
}

impl ObjectStore {
    /// Opens the store rooted at `base_dir`, creating the directory if needed
    pub fn open(base_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| StoreError::io(&base_dir, e))?;
        Ok(Self { base_dir })
    }

    /// Opens the store for `date` below `archive_root`, e.g. `archives/16October2026`
    pub fn open_dated(archive_root: &Path, date: NaiveDate) -> StoreResult<Self> {
        Self::open(archive_root.join(dated_directory_name(date)))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolves an object name to its file path
    pub fn path_of(&self, name: &ObjectName, format: Format) -> PathBuf {
        let mut path = self.base_dir.join(name.relative_path());
        if let Some(extension) = format.extension() {
            let mut file_name = name.leaf().to_string();
            file_name.push('.');
            file_name.push_str(extension);
            path.set_file_name(file_name);
        }
        path
    }

    /// Resolves an object name to a directory path
    pub fn dir_of(&self, name: &ObjectName) -> PathBuf {
        self.base_dir.join(name.relative_path())
    }

    /// Writes `data` to the object `name`
    ///
    /// Missing parent directories are created first. Line objects receive one
    /// record per array element, or a single record for any other value.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        name: &ObjectName,
        data: &T,
        options: WriteOptions,
    ) -> StoreResult<PathBuf> {
        let path = self.path_of(name, options.format);
        tracing::debug!(
            "Writing {} (format={:?}, append={})",
            path.display(),
            options.format,
            options.append
        );

        let value = serde_json::to_value(data).map_err(|e| StoreError::json(&path, e))?;
        let file = self.open_for_write(&path, options.append)?;
        let mut writer = BufWriter::new(file);

        match options.format {
            Format::Json { pretty: false } => {
                serde_json::to_writer(&mut writer, &value)
                    .map_err(|e| StoreError::json(&path, e))?;
            }
            Format::Json { pretty: true } => {
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
                let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
                sort_keys(&value)
                    .serialize(&mut serializer)
                    .map_err(|e| StoreError::json(&path, e))?;
            }
            Format::Lines => {
                let records: Vec<&Value> = match &value {
                    Value::Array(items) => items.iter().collect(),
                    other => vec![other],
                };
                for record in records {
                    serde_json::to_writer(&mut writer, record)
                        .map_err(|e| StoreError::json(&path, e))?;
                    writer.write_all(b"\n").map_err(|e| StoreError::io(&path, e))?;
                }
            }
            Format::Raw => {
                let text = match &value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                writer
                    .write_all(text.as_bytes())
                    .map_err(|e| StoreError::io(&path, e))?;
            }
        }

        writer.flush().map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }

    /// Writes raw bytes (a downloaded file) to `name`, replacing any previous content
    ///
    /// The bytes land in a `.part` sibling first and are renamed into place, so
    /// an interrupted write never leaves a truncated object under `name`.
    pub fn write_bytes(&self, name: &ObjectName, bytes: &[u8]) -> StoreResult<PathBuf> {
        let path = self.path_of(name, Format::Raw);
        let partial = path.with_file_name(format!("{}.{}", name.leaf(), PARTIAL_SUFFIX));

        let mut file = self.open_for_write(&partial, false)?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&partial, e))?;
        drop(file);

        fs::rename(&partial, &path).map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }

    /// Writes the zero-byte done marker inside the directory `scope`
    pub fn write_marker(&self, scope: &ObjectName) -> StoreResult<PathBuf> {
        let marker = scope.child(DONE_MARKER)?;
        self.write_bytes(&marker, &[])
    }

    /// Returns true if the done marker inside `scope` exists
    pub fn marker_exists(&self, scope: &ObjectName) -> bool {
        self.dir_of(scope).join(DONE_MARKER).is_file()
    }

    /// Loads a JSON object, or `None` if it was never written
    pub fn load_json(&self, name: &ObjectName) -> StoreResult<Option<Value>> {
        let path = self.path_of(name, Format::JSON);
        let Some(content) = read_optional(&path)? else {
            tracing::debug!("{} not found", path.display());
            return Ok(None);
        };

        tracing::debug!("Loading {} from {}", name, path.display());
        let value = serde_json::from_str(&content).map_err(|e| StoreError::json(&path, e))?;
        Ok(Some(value))
    }

    /// Loads every record of a line object, or `None` if it was never written
    pub fn load_lines(&self, name: &ObjectName) -> StoreResult<Option<Vec<Value>>> {
        let path = self.path_of(name, Format::Lines);
        let Some(content) = read_optional(&path)? else {
            tracing::debug!("{} not found", path.display());
            return Ok(None);
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|e| StoreError::json(&path, e)))
            .collect::<StoreResult<Vec<Value>>>()
            .map(Some)
    }

    /// Returns true if the object exists in the given format
    pub fn exists(&self, name: &ObjectName, format: Format) -> bool {
        self.path_of(name, format).exists()
    }

    /// Returns true if `name` exists as a directory
    pub fn dir_exists(&self, name: &ObjectName) -> bool {
        self.dir_of(name).is_dir()
    }

    /// Deletes the directory `name` and everything below it
    ///
    /// Returns false if there was nothing to delete.
    pub fn remove_tree(&self, name: &ObjectName) -> StoreResult<bool> {
        let dir = self.dir_of(name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(&dir, e)),
        }
    }

    fn open_for_write(&self, path: &Path, append: bool) -> StoreResult<fs::File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        options.open(path).map_err(|e| StoreError::io(path, e))
    }
}

/// Directory name used for one day's export, e.g. `16October2026`
pub fn dated_directory_name(date: NaiveDate) -> String {
    date.format("%d%B%Y").to_string()
}

fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Rebuilds every object with its keys in sorted order
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
