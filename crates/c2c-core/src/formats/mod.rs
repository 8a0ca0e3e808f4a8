//! # Formats Module
//!
//! Serialization of the mission log to and from its portable file format.
//!
//! This module contains:
//! - JSON export (pretty-printed array, file name policy)
//! - JSON import (all-or-nothing validation, legacy label normalization)
//!
//! Note: File I/O operations remain in the app layer (apps/c2c).
//! This module only handles format conversion (pure transformations).

mod json_log;

pub use json_log::*;
