//! # C2C Library
//!
//! This library exposes the C2C app modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod error;
pub mod shell;

pub use error::CliError;

// Re-export c2c_core for convenience
pub use c2c_core;
