//! Error types for Stickies
//!
//! All errors use thiserror for structured error handling.
//! Persistence failures are mostly logged by the caller and not surfaced;
//! see `services::notes` for which ones abort an operation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid value for '{key}': '{value}' ({reason})")]
    Parse {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing resource: {}", .0.display())]
    MissingResource(PathBuf),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Note is locked: {0}")]
    NoteLocked(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("RTF error: {0}")]
    Rtf(String),
}

impl AppError {
    pub fn parse(key: &str, value: &str, reason: impl ToString) -> Self {
        AppError::Parse {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
