//! Error types for structprompt.
//!
//! Library crates use [`StructPromptError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all structprompt operations.
#[derive(Debug, thiserror::Error)]
pub enum StructPromptError {
    /// A path could not be resolved to a section without aliasing two
    /// different kinds of node under one key.
    #[error("addressing error at `{path}`: {message}")]
    Addressing { path: String, message: String },

    /// A value of unsupported shape was assigned to a section.
    #[error("invalid assignment: {message}")]
    InvalidAssignment { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// TOML/JSON parsing error for stage or prompt definition files.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Structural defect in loaded data (duplicate sibling keys, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StructPromptError>;

impl StructPromptError {
    /// Create an addressing error for the given (display form of a) path.
    pub fn addressing(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Addressing {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid-assignment error from any displayable message.
    pub fn invalid_assignment(msg: impl Into<String>) -> Self {
        Self::InvalidAssignment {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
