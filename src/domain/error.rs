//! Domain-level error types for wechat-txt-export.
//!
//! All errors are typed with `thiserror` and carry enough context to be
//! shown to the user as a status line.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Conversation or user name does not resolve in the message store.
    #[error("User not found: {name}")]
    NotFound { name: String },

    /// The message store could not be opened.
    #[error("Message store unavailable at {path}: {message}")]
    StoreUnavailable {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A page of messages could not be fetched.
    #[error("Failed to retrieve messages: {message}")]
    PageRetrieval {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to query the database outside of message paging.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Writing the transcript failed.
    #[error("Failed to write transcript: {message}")]
    OutputWrite {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration or argument error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a database error from rusqlite error.
    pub fn database(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a page retrieval error from rusqlite error.
    pub fn page_retrieval(err: rusqlite::Error) -> Self {
        Self::PageRetrieval {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a store-unavailable error for the given path.
    pub fn store_unavailable(path: impl Into<PathBuf>, err: rusqlite::Error) -> Self {
        Self::StoreUnavailable {
            path: path.into(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create an output write error with context.
    pub fn output_write(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::OutputWrite {
            message: message.into(),
            source: err,
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
