//! Errors surfaced by the command line and the shell.

use c2c_core::{ExportError, ImportError, ParseCommandError, ParseFieldError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// A log file could not be read or was not UTF-8.
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// An export file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// Reading commands from the terminal failed.
    #[error("input error: {0}")]
    Input(io::Error),

    /// An input line was not UTF-8; the line is skipped.
    #[error("line {line} is not valid UTF-8")]
    Encoding { line: usize },

    /// Writing to the terminal failed.
    #[error("output error: {0}")]
    Output(#[from] io::Error),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// The log file was rejected; the log is unchanged.
    #[error("import rejected: {0}")]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("mission log is empty; nothing to export")]
    EmptyLog,

    #[error(transparent)]
    Field(#[from] ParseFieldError),

    #[error(transparent)]
    Command(#[from] ParseCommandError),

    #[error("no log entry with id `{0}`")]
    UnknownEntry(String),

    #[error("nothing to copy: {0}")]
    NothingToCopy(String),

    /// A shell command was malformed.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Whether the shell must stop. Only a broken input or output stream is
    /// fatal; everything else is reported and the session continues.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, CliError::Input(_) | CliError::Output(_))
    }
}
