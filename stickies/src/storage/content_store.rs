//! Per-note content files
//!
//! Stores each note's styled text as an RTF document named after the note
//! id: `<storage root>/notes_rtf/<id>.rtf`.
//!
//! Reads never fail: a missing or unreadable file yields empty content and
//! a log line, so one damaged file cannot keep the other notes from loading.

use crate::config;
use crate::error::{AppError, Result};
use crate::rich_text::{rtf, StyledText};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory of RTF content files
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a content store under the given storage location
    pub fn new(storage_root: &Path) -> Self {
        Self {
            root: storage_root.join(config::CONTENT_DIR),
        }
    }

    /// Create the content directory if needed
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        tracing::debug!("Content store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Write a note's content, replacing any previous file
    pub fn write(&self, id: &str, content: &StyledText) -> Result<()> {
        self.initialize()?;

        let path = self.path_for(id)?;

        // Write to temp file first (atomic write)
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, rtf::write(content))?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Wrote content: {} ({} chars)", id, content.char_len());

        Ok(())
    }

    /// Read a note's content by id
    pub fn read(&self, id: &str) -> StyledText {
        self.read_file(&file_name_for(id))
    }

    /// Read content from a file name recorded in the metadata.
    /// Only the final path component is used.
    pub fn read_file(&self, file_name: &str) -> StyledText {
        let Some(name) = Path::new(file_name).file_name() else {
            tracing::warn!("Ignoring invalid content file name: {:?}", file_name);
            return StyledText::new();
        };

        let path = self.root.join(name);
        match Self::try_read(&path) {
            Ok(content) => content,
            Err(AppError::MissingResource(path)) => {
                tracing::warn!("Content file not found: {:?}", path);
                StyledText::new()
            }
            Err(e) => {
                tracing::warn!("Failed to read content file {:?}: {}", path, e);
                StyledText::new()
            }
        }
    }

    fn try_read(path: &Path) -> Result<StyledText> {
        if !path.exists() {
            return Err(AppError::MissingResource(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let content = rtf::read(&text)?;

        tracing::debug!("Read content: {:?} ({} chars)", path, content.char_len());

        Ok(content)
    }

    /// Check if a note has a content file
    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).is_ok_and(|path| path.exists())
    }

    /// Delete a note's content file
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;

        if !path.exists() {
            return Ok(()); // Already deleted
        }

        fs::remove_file(&path)?;

        tracing::debug!("Deleted content: {}", id);

        Ok(())
    }

    /// Get file path for a note id. Ids that are not a single plain
    /// file-name component are rejected.
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        if !is_valid_id(id) {
            return Err(AppError::Validation(format!("Invalid note id: {:?}", id)));
        }
        Ok(self.root.join(file_name_for(id)))
    }

    /// Get content directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// True when `id` can name a file inside the content directory
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
}

fn file_name_for(id: &str) -> String {
    format!("{}.{}", id, config::CONTENT_EXTENSION)
}
