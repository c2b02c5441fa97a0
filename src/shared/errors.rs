//! Strict error handling with CommandError enum
//!
//! All errors are serializable for IPC communication with the frontend.

use serde::Serialize;
use thiserror::Error;

/// Command execution errors
///
/// Every fallible operation at the UI boundary returns one of these, so the
/// caller can decide whether to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum CommandError {
    /// System I/O error (file operations, config directories, etc.)
    #[error("System I/O error: {0}")]
    SystemIO(String),

    /// Persistent history store failed to read or commit
    #[error("Storage error: {0}")]
    Storage(String),

    /// Clipboard read/write failed or clipboard is unavailable
    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    /// Invalid input or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Window operation error
    #[error("Window error: {0}")]
    WindowError(String),

    /// Unknown/unexpected error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::SystemIO(err.to_string())
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::InvalidInput(format!("JSON error: {}", err))
    }
}

impl From<redb::DatabaseError> for CommandError {
    fn from(err: redb::DatabaseError) -> Self {
        CommandError::Storage(format!("Failed to open database: {}", err))
    }
}

impl From<redb::TransactionError> for CommandError {
    fn from(err: redb::TransactionError) -> Self {
        CommandError::Storage(format!("Transaction error: {}", err))
    }
}

impl From<redb::TableError> for CommandError {
    fn from(err: redb::TableError) -> Self {
        CommandError::Storage(format!("Failed to open table: {}", err))
    }
}

impl From<redb::StorageError> for CommandError {
    fn from(err: redb::StorageError) -> Self {
        CommandError::Storage(err.to_string())
    }
}

impl From<redb::CommitError> for CommandError {
    fn from(err: redb::CommitError) -> Self {
        CommandError::Storage(format!("Failed to commit: {}", err))
    }
}

#[cfg(feature = "desktop")]
impl From<tauri::Error> for CommandError {
    fn from(err: tauri::Error) -> Self {
        CommandError::WindowError(err.to_string())
    }
}

/// Helper type alias for command results
pub type CommandResult<T> = Result<T, CommandError>;
