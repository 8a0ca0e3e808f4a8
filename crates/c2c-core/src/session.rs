//! # Session Module
//!
//! The single-writer state a front end drives: the descriptor being edited,
//! the code derived from it, and the mission log.
//!
//! Recomputation is explicit. Editing a field does not touch the code until
//! the caller invokes [`Session::recompute`], so a front end decides when the
//! displayed code is refreshed.

use crate::clock::{Clock, SystemClock};
use crate::derive::{DerivedCode, derive};
use crate::descriptor::{DeviceDescriptor, Field};
use crate::formats::{self, ExportBundle, ExportError, ImportError};
use crate::log::{HistoryEntry, MissionLog};

/// One operator session.
#[derive(Debug, Clone)]
pub struct Session<C = SystemClock> {
    descriptor: DeviceDescriptor,
    code: DerivedCode,
    log: MissionLog<C>,
}

impl Default for Session<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> Session<C> {
    /// A fresh session: initial form, pending code, empty log.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            descriptor: DeviceDescriptor::initial(),
            code: DerivedCode::Pending,
            log: MissionLog::with_clock(clock),
        }
    }

    /// The descriptor as currently edited.
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    /// The code as of the last [`recompute`](Self::recompute).
    pub fn code(&self) -> &DerivedCode {
        &self.code
    }

    /// The mission log.
    pub fn log(&self) -> &MissionLog<C> {
        &self.log
    }

    /// Edit one field. Serial number and model are uppercased.
    pub fn set(&mut self, field: Field, value: &str) {
        if field.is_uppercased() {
            self.descriptor.set(field, value.to_uppercase());
        } else {
            self.descriptor.set(field, value);
        }
    }

    /// Replace the whole descriptor, applying the same normalization as
    /// [`set`](Self::set).
    pub fn load(&mut self, descriptor: DeviceDescriptor) {
        for field in Field::ALL {
            self.set(field, descriptor.get(field));
        }
    }

    /// Re-derive the code from the current descriptor.
    pub fn recompute(&mut self) -> &DerivedCode {
        self.code = derive(&self.descriptor);
        &self.code
    }

    /// Save the current code to the log. `None` if the code is a sentinel.
    pub fn save(&mut self, label: &str) -> Option<HistoryEntry> {
        self.log.append(&self.code, &self.descriptor, label)
    }

    /// Delete a log entry.
    pub fn remove(&mut self, id: &str) -> bool {
        self.log.remove(id)
    }

    /// Reset the form and the code. The log is kept.
    pub fn clear(&mut self) {
        self.descriptor = DeviceDescriptor::initial();
        self.code = DerivedCode::Pending;
    }

    /// Serialize the log for writing to disk.
    pub fn export(&self, requested_name: &str) -> Result<ExportBundle, ExportError> {
        formats::export(&self.log, requested_name, self.log.clock().now())
    }

    /// Replace the log with the contents of a log file.
    ///
    /// Returns the number of entries now in the log. On error the log is
    /// left exactly as it was.
    pub fn import(&mut self, raw_text: &str) -> Result<usize, ImportError> {
        let entries = formats::import(raw_text)?;
        let count = entries.len();
        self.log.replace_all(entries);
        Ok(count)
    }
}

// =============================================================================
// TESTS
// =============================================================================
