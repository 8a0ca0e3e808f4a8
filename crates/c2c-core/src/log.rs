//! # Mission Log
//!
//! Newest-first record of saved derivations.
//!
//! Design rules:
//! - Entries are prepended on save and never re-sorted.
//! - Entries are immutable once created; the log only hands out shared
//!   references.
//! - Only real codes are saved. `PENDING` and `ERROR` are rejected silently.
//! - Import replaces the whole log (see [`MissionLog::replace_all`]).

use crate::clock::{Clock, SystemClock, format_timestamp};
use crate::derive::DerivedCode;
use crate::descriptor::DeviceDescriptor;
use serde::{Deserialize, Serialize};

/// Label stored when an entry is saved without one.
pub const UNTITLED_LABEL: &str = "Untitled Mission";

/// Serial number or address stored when the descriptor field is blank.
pub const NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// HISTORY ENTRY
// =============================================================================

/// One saved derivation.
///
/// Field order matches the export file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique within the log.
    pub id: String,
    /// Creation time, `YYYY-MM-DDTHH:MM:SSZ` for entries saved by this tool.
    /// Imported entries keep whatever text they carried.
    pub timestamp: String,
    /// Operator-supplied label.
    pub label: String,
    /// Serial number at save time.
    pub serial_number: String,
    /// Device address at save time.
    pub device_ip: String,
    /// The derived code text.
    pub password: String,
}

// =============================================================================
// MISSION LOG
// =============================================================================

/// Session-owned, newest-first collection of [`HistoryEntry`].
#[derive(Debug, Clone)]
pub struct MissionLog<C = SystemClock> {
    /// Newest first.
    entries: Vec<HistoryEntry>,

    /// Source of ids and timestamps.
    clock: C,

    /// Largest numeric id issued or imported so far.
    /// New ids are always strictly greater.
    last_id: i64,
}

impl Default for MissionLog<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl MissionLog<SystemClock> {
    /// An empty log on the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> MissionLog<C> {
    /// An empty log on the given clock.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Vec::new(),
            clock,
            last_id: 0,
        }
    }

    /// The clock this log stamps entries with.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Save a derivation.
    ///
    /// Returns `None` without touching the log when `code` is a sentinel.
    /// Otherwise the new entry is prepended and a copy is returned.
    pub fn append(
        &mut self,
        code: &DerivedCode,
        descriptor: &DeviceDescriptor,
        label: &str,
    ) -> Option<HistoryEntry> {
        let code = code.as_code()?;
        let now = self.clock.now();

        let entry = HistoryEntry {
            id: self.next_id(now.as_millisecond()),
            timestamp: format_timestamp(now),
            label: or_placeholder(label, UNTITLED_LABEL),
            serial_number: or_placeholder(&descriptor.serial_number, NOT_AVAILABLE),
            device_ip: or_placeholder(&descriptor.device_ip, NOT_AVAILABLE),
            password: code.as_str().to_string(),
        };

        self.entries.insert(0, entry.clone());
        Some(entry)
    }

    /// Delete the entry with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(position) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };
        self.entries.remove(position);
        true
    }

    /// Swap in a complete new set of entries, in the given order.
    ///
    /// Used by import. Subsequent ids stay above any numeric id imported.
    pub fn replace_all(&mut self, entries: Vec<HistoryEntry>) {
        let imported_max = entries
            .iter()
            .filter_map(|e| e.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        self.last_id = self.last_id.max(imported_max);
        self.entries = entries;
    }

    /// Read-only view, newest first.
    pub fn snapshot(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Epoch milliseconds, bumped past the last issued id when the clock has
    /// not moved.
    ///
    /// Once the numeric range is exhausted ids become `<i64::MAX>-<n>`, with
    /// `n` chosen so the id is not already in the log.
    fn next_id(&mut self, millis: i64) -> String {
        let numeric = if millis > self.last_id {
            Some(millis)
        } else {
            self.last_id.checked_add(1)
        };
        if let Some(id) = numeric {
            self.last_id = id;
            return id.to_string();
        }

        let mut sequence = self.entries.len();
        loop {
            let candidate = format!("{}-{sequence}", self.last_id);
            if self.get(&candidate).is_none() {
                return candidate;
            }
            sequence += 1;
        }
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
