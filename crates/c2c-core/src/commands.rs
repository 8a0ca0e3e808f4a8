//! # Commands Module
//!
//! Copyable terminal commands built from descriptor fields.
//!
//! These strings are one-way output for the operator's clipboard; the core
//! never reads them back.

use crate::descriptor::{DeviceDescriptor, Field};
use crate::log::HistoryEntry;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A terminal command that targets the device described by a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/identify <serial number>`
    Identify,
    /// `/scan <device name>`
    Scan,
    /// `/ping <device ip>`
    Ping,
    /// `/override <device ip>`
    Override,
}

impl Command {
    /// The commands shown next to the form, in display order.
    pub const FORM: [Command; 3] = [Command::Identify, Command::Scan, Command::Ping];

    /// The verb, including its leading slash.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Command::Identify => "/identify",
            Command::Scan => "/scan",
            Command::Ping => "/ping",
            Command::Override => "/override",
        }
    }

    /// The descriptor field the command targets.
    #[must_use]
    pub fn source(self) -> Field {
        match self {
            Command::Identify => Field::SerialNumber,
            Command::Scan => Field::DeviceName,
            Command::Ping | Command::Override => Field::DeviceIp,
        }
    }

    /// Render against a descriptor. `None` while the source field is empty.
    #[must_use]
    pub fn render(self, descriptor: &DeviceDescriptor) -> Option<String> {
        self.with_argument(descriptor.get(self.source()))
    }

    /// Render `/override` for a saved log entry.
    #[must_use]
    pub fn override_for(entry: &HistoryEntry) -> String {
        format!("{} {}", Command::Override.verb(), entry.device_ip)
    }

    fn with_argument(self, argument: &str) -> Option<String> {
        (!argument.is_empty()).then(|| format!("{} {}", self.verb(), argument))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verb()[1..])
    }
}

/// A command name that is not one of identify, scan, ping or override.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command `{0}` (expected one of: identify, scan, ping, override)")]
pub struct ParseCommandError(pub String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('/').to_ascii_lowercase().as_str() {
            "identify" => Ok(Command::Identify),
            "scan" => Ok(Command::Scan),
            "ping" => Ok(Command::Ping),
            "override" => Ok(Command::Override),
            other => Err(ParseCommandError(other.to_string())),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor {
            serial_number: "A1B2-C3D4".to_string(),
            device_name: "MainServer".to_string(),
            device_ip: "192.168.0.1".to_string(),
            ..DeviceDescriptor::initial()
        }
    }

    #[test]
    fn renders_form_commands() {
        let d = descriptor();
        assert_eq!(
            Command::Identify.render(&d),
            Some("/identify A1B2-C3D4".to_string())
        );
        assert_eq!(Command::Scan.render(&d), Some("/scan MainServer".to_string()));
        assert_eq!(Command::Ping.render(&d), Some("/ping 192.168.0.1".to_string()));
        assert_eq!(
            Command::Override.render(&d),
            Some("/override 192.168.0.1".to_string())
        );
    }

    #[test]
    fn empty_source_renders_nothing() {
        let d = DeviceDescriptor::initial();
        for command in Command::FORM {
            assert_eq!(command.render(&d), None);
        }
    }

    #[test]
    fn override_uses_saved_address() {
        let entry = HistoryEntry {
            id: "1".to_string(),
            timestamp: String::new(),
            label: "Relay".to_string(),
            serial_number: "N/A".to_string(),
            device_ip: "10.0.0.7".to_string(),
            password: "00012864".to_string(),
        };
        assert_eq!(Command::override_for(&entry), "/override 10.0.0.7");
    }

    #[test]
    fn parses_with_or_without_slash() {
        assert_eq!("ping".parse(), Ok(Command::Ping));
        assert_eq!("/Identify".parse(), Ok(Command::Identify));
        assert_eq!(
            "Reboot".parse::<Command>(),
            Err(ParseCommandError("reboot".to_string()))
        );
        assert_eq!(Command::Scan.to_string(), "scan");
    }
}
