//! Validated object names
//!
//! An object name is a relative path inside the archive, built one segment at a
//! time. Segments never contain separators, so a name can only ever resolve to a
//! location below the archive's base directory.

use crate::store::{StoreError, StoreResult};
use std::fmt;
use std::path::PathBuf;

/// Name of a logical object, e.g. `conversations/channels/general/C0123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName {
    segments: Vec<String>,
}

impl ObjectName {
    /// Creates a top-level name from a single segment
    pub fn new(segment: impl Into<String>) -> StoreResult<Self> {
        let segment = segment.into();
        validate_segment(&segment)?;
        Ok(Self {
            segments: vec![segment],
        })
    }

    /// Creates a name from a sequence of segments
    ///
    /// # Example
    ///
    /// ```
    /// use slack_archiver::store::ObjectName;
    ///
    /// let name = ObjectName::from_segments(["conversations", "channels", "general"]).unwrap();
    /// assert_eq!(name.to_string(), "conversations/channels/general");
    /// assert!(ObjectName::from_segments(["conversations", "../etc"]).is_err());
    /// ```
    pub fn from_segments<I, S>(segments: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidName(
                "object name needs at least one segment".to_string(),
            ));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Returns a new name with `segment` appended
    pub fn child(&self, segment: impl Into<String>) -> StoreResult<Self> {
        let segment = segment.into();
        validate_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// The final segment (the file stem)
    pub fn leaf(&self) -> &str {
        // Non-empty by construction
        &self.segments[self.segments.len() - 1]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Relative path of this name with no extension applied
    pub(crate) fn relative_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Checks that a segment is usable as a single path component
pub fn validate_segment(segment: &str) -> StoreResult<()> {
    if segment.is_empty() {
        return Err(StoreError::InvalidName(
            "object name segment cannot be empty".to_string(),
        ));
    }

    if segment == "." || segment == ".." {
        return Err(StoreError::InvalidName(format!(
            "object name segment cannot be '{}'",
            segment
        )));
    }

    if segment.contains(['/', '\\', '\0']) {
        return Err(StoreError::InvalidName(format!(
            "object name segment '{}' contains a path separator",
            segment.escape_default()
        )));
    }

    Ok(())
}

/// Maps an arbitrary remote name (a file title, an emoji name) to a valid segment
pub fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
