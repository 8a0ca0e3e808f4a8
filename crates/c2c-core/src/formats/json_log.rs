//! JSON log file format.
//!
//! ```text
//! [
//!   {
//!     "id": "1792315800000",
//!     "timestamp": "2026-10-18T09:30:00Z",
//!     "label": "Relay room",
//!     "serialNumber": "A1B2-C3D4",
//!     "deviceIp": "192.168.0.1",
//!     "password": "00012864"
//!   }
//! ]
//! ```
//!
//! Import is atomic: either every element is valid and the whole sequence is
//! returned, or nothing is. `label` is optional on input; older logs predate
//! it and get [`IMPORTED_LABEL`].

use crate::clock::{Clock, format_date};
use crate::log::{HistoryEntry, MissionLog};
use jiff::Timestamp;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Suffix enforced on export file names.
pub const LOG_FILE_EXTENSION: &str = ".json";

/// Prefix of the default export file name; the UTC date follows.
pub const DEFAULT_FILE_PREFIX: &str = "c2c-log-";

/// Label given to imported entries that have none.
pub const IMPORTED_LABEL: &str = "Imported Entry";

// =============================================================================
// ERRORS
// =============================================================================

/// Why an element of an import payload was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDefect {
    /// The element is not a JSON object.
    NotAnObject,
    /// A required field is absent, null, false, zero, or empty.
    MissingField(&'static str),
}

impl fmt::Display for EntryDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDefect::NotAnObject => f.write_str("not an object"),
            EntryDefect::MissingField(name) => write!(f, "missing or empty `{name}`"),
        }
    }
}

/// Import failures. The log is never modified when one of these is returned.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The text is not JSON.
    #[error("log file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The JSON is valid but not an array.
    #[error("log file must contain an array of entries")]
    NotAnArray,

    /// One element failed validation.
    #[error("invalid log entry at index {index}: {defect}")]
    InvalidEntry { index: usize, defect: EntryDefect },
}

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Serialization failed.
    #[error("failed to serialize log: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The requested name is a path rather than a bare file name.
    #[error("export name `{0}` must not contain `/` or `\\`")]
    InvalidName(String),
}

// =============================================================================
// EXPORT
// =============================================================================

/// A serialized log ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    /// UTF-8 JSON text.
    pub bytes: Vec<u8>,
    /// File name with the enforced extension.
    pub file_name: String,
}

/// Serialize the whole log, newest first.
///
/// Read-only: the log is not modified. The requested name must be a bare
/// file name; path separators are rejected.
pub fn export<C: Clock>(
    log: &MissionLog<C>,
    requested_name: &str,
    now: Timestamp,
) -> Result<ExportBundle, ExportError> {
    if requested_name.contains(['/', '\\']) {
        return Err(ExportError::InvalidName(requested_name.trim().to_string()));
    }
    Ok(ExportBundle {
        bytes: export_entries(log.snapshot())?,
        file_name: export_file_name(requested_name, now),
    })
}

/// Pretty-print entries as a JSON array with two-space indentation.
pub fn export_entries(entries: &[HistoryEntry]) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(entries)?)
}

/// Resolve the export file name.
///
/// The requested name is trimmed; an empty result falls back to
/// `c2c-log-YYYY-MM-DD`. `.json` is appended unless already present.
#[must_use]
pub fn export_file_name(requested_name: &str, now: Timestamp) -> String {
    let trimmed = requested_name.trim();
    let base = if trimmed.is_empty() {
        format!("{DEFAULT_FILE_PREFIX}{}", format_date(now))
    } else {
        trimmed.to_string()
    };

    if base.ends_with(LOG_FILE_EXTENSION) {
        base
    } else {
        format!("{base}{LOG_FILE_EXTENSION}")
    }
}

// =============================================================================
// IMPORT
// =============================================================================

/// Parse and validate a log file.
///
/// Every element must be an object whose `id` and `password` are neither
/// absent, `null`, `false`, zero nor empty. Non-string values are accepted
/// and kept as text. On success each entry's label is normalized; the other
/// fields pass through as text.
pub fn import(raw_text: &str) -> Result<Vec<HistoryEntry>, ImportError> {
    let Value::Array(items) = serde_json::from_str::<Value>(raw_text)? else {
        return Err(ImportError::NotAnArray);
    };

    // Validate everything before building anything.
    let objects = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => check_entry(&map)
                .map(|()| map)
                .map_err(|defect| ImportError::InvalidEntry { index, defect }),
            _ => Err(ImportError::InvalidEntry {
                index,
                defect: EntryDefect::NotAnObject,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(objects.into_iter().map(normalize).collect())
}

fn check_entry(map: &Map<String, Value>) -> Result<(), EntryDefect> {
    for required in ["id", "password"] {
        if !is_present(map, required) {
            return Err(EntryDefect::MissingField(required));
        }
    }
    Ok(())
}

fn normalize(map: Map<String, Value>) -> HistoryEntry {
    let label = if is_present(&map, "label") {
        text(&map, "label")
    } else {
        IMPORTED_LABEL.to_string()
    };
    HistoryEntry {
        id: text(&map, "id"),
        timestamp: text(&map, "timestamp"),
        label,
        serial_number: text(&map, "serialNumber"),
        device_ip: text(&map, "deviceIp"),
        password: text(&map, "password"),
    }
}

/// A field counts as present unless it is absent, `null`, `false`, zero or
/// the empty string. Arrays and objects are present even when empty.
fn is_present(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Field value as text: strings verbatim, absent or null as empty, anything
/// else in its JSON form.
fn text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
