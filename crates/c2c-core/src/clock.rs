//! # Clock Module
//!
//! Source of "now" for entry ids, entry timestamps and default export names.
//!
//! The core never reads the wall clock on its own. Callers hand a [`Clock`] to
//! the [`MissionLog`](crate::MissionLog); production code uses [`SystemClock`],
//! tests use [`ManualClock`] for reproducible output.

use jiff::Timestamp;
use std::cell::Cell;

/// Fixed calendar format used for entry timestamps (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Fixed calendar format used for the default export file name (UTC).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A source of the current instant.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// Interior mutability lets a test keep advancing the clock after it has been
/// moved into a log or session.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Create a clock frozen at the given Unix epoch second.
    ///
    /// Out-of-range values fall back to the Unix epoch.
    #[must_use]
    pub fn at_second(second: i64) -> Self {
        Self::new(Timestamp::from_second(second).unwrap_or(Timestamp::UNIX_EPOCH))
    }

    /// Move the clock to `instant`.
    pub fn set(&self, instant: Timestamp) {
        self.now.set(instant);
    }

    /// Move the clock forward by `millis` milliseconds, saturating at the
    /// largest representable instant.
    pub fn advance_millis(&self, millis: i64) {
        let current = self.now.get();
        let target = current.as_millisecond().saturating_add(millis);
        if let Ok(next) = Timestamp::from_millisecond(target) {
            self.now.set(next);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Format an instant with [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(instant: Timestamp) -> String {
    instant.strftime(TIMESTAMP_FORMAT).to_string()
}

/// Format the UTC calendar date of an instant with [`DATE_FORMAT`].
#[must_use]
pub fn format_date(instant: Timestamp) -> String {
    instant.strftime(DATE_FORMAT).to_string()
}

// =============================================================================
// TESTS
// =============================================================================
