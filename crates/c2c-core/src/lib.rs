//! # C2C Core
//!
//! Deterministic unlock-code engine and mission log for C2C Decipher.
//!
//! The crate is split along the data flow:
//!
//! ```text
//! DeviceDescriptor ──► validate ──► derive ──► DerivedCode
//!                                                  │ save
//!                                                  ▼
//!                   formats::export ◄──── MissionLog ◄──── formats::import
//! ```
//!
//! Nothing here touches the filesystem, the network or the wall clock directly.
//! Time enters through the [`Clock`] trait so that ids, timestamps and default
//! export names are reproducible in tests. File I/O lives in the app layer
//! (`apps/c2c`).

pub mod clock;
pub mod commands;
pub mod derive;
pub mod descriptor;
pub mod formats;
pub mod log;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{Command, ParseCommandError};
pub use derive::{DeriveError, DerivedCode, Segments, UnlockCode, derive, try_derive};
pub use descriptor::{Advisory, DeviceDescriptor, Field, ParseFieldError};
pub use formats::{EntryDefect, ExportBundle, ExportError, ImportError};
pub use log::{HistoryEntry, MissionLog};
pub use session::Session;
