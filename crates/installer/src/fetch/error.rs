//! Error types for remote fetches

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching a remote archive
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP-related errors with context
    #[error("HTTP request to '{url}' failed: {source}")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status} for '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// File system I/O errors with file context
    #[error("File operation ({operation}) failed on '{}': {source}", path.display())]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client itself could not be built
    #[error("Could not create HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Create,
    Write,
    Move,
    CreateDir,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOperation::Create => write!(f, "create"),
            FileOperation::Write => write!(f, "write"),
            FileOperation::Move => write!(f, "move"),
            FileOperation::CreateDir => write!(f, "create directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    pub(crate) fn file_system(path: impl Into<PathBuf>, operation: FileOperation, source: std::io::Error) -> Self {
        FetchError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Check if a later attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            FetchError::HttpRequest { source, .. } => source.is_timeout() || source.is_connect() || source.is_body(),
            FetchError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            FetchError::FileSystem { .. } | FetchError::InvalidUrl { .. } | FetchError::Client { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            FetchError::HttpRequest { .. } => "http",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::FileSystem { .. } => "io",
            FetchError::InvalidUrl { .. } => "url",
            FetchError::Client { .. } => "client",
        }
    }
}
