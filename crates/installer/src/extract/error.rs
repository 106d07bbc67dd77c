//! Error types for archive extraction

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Cannot read archive {}: {source}", path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create extraction directory {}: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not extract {} after {attempts} attempts. Last error: {last_error}", archive.display())]
    Exhausted {
        archive: PathBuf,
        attempts: usize,
        last_error: String,
    },
}

pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ExtractError::ArchiveUnreadable { .. } => "archive_access",
            ExtractError::CreateDestination { .. } => "filesystem",
            ExtractError::Exhausted { .. } => "tools_exhausted",
        }
    }
}
