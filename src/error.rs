//! Error handling module for stepscript
//!
//! Provides the single error type used by validation, command execution and
//! file writes. A run records at most one of these and stops.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for stepscript
#[derive(Error, Debug)]
pub enum StepScriptError {
    /// Malformed script shape, raised at construction before anything runs
    #[error("Validation error: {0}")]
    Validation(String),

    /// A foreground command exited with a non-zero code
    #[error("Command '{command}' failed with exit code {code}")]
    CommandFailed { command: String, code: i32 },

    /// A foreground command was killed by a signal and has no exit code
    #[error("Command '{command}' was terminated by a signal")]
    CommandTerminated { command: String },

    /// The process could not be started at all
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A file step could not be written
    #[error("Failed to write file {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO errors outside of steps (e.g. unreadable current directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Script text that is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for stepscript operations
pub type Result<T> = std::result::Result<T, StepScriptError>;

impl StepScriptError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Exit code carried by a failed command, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}
