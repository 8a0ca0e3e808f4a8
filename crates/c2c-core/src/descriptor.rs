//! # Descriptor Module
//!
//! The seven-field device descriptor and its validator.
//!
//! Validation has two tiers:
//! - **Completeness** gates derivation: any empty field means the code is
//!   still pending.
//! - **Advisories** report fields that do not match their expected shape
//!   (`XXXX-XXXX`, `XXX-XXX`, day/month ranges, integer latency). They never
//!   block derivation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// FIELD
// =============================================================================

/// Names one of the seven descriptor fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    SerialNumber,
    DeviceName,
    DeviceIp,
    DeviceModel,
    FabDay,
    FabMonth,
    Latency,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: [Field; 7] = [
        Field::SerialNumber,
        Field::DeviceName,
        Field::DeviceIp,
        Field::DeviceModel,
        Field::FabDay,
        Field::FabMonth,
        Field::Latency,
    ];

    /// The camelCase name used in files and messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Field::SerialNumber => "serialNumber",
            Field::DeviceName => "deviceName",
            Field::DeviceIp => "deviceIp",
            Field::DeviceModel => "deviceModel",
            Field::FabDay => "fabDay",
            Field::FabMonth => "fabMonth",
            Field::Latency => "latency",
        }
    }

    /// Whether the collaborator uppercases this field on entry.
    #[must_use]
    pub fn is_uppercased(self) -> bool {
        matches!(self, Field::SerialNumber | Field::DeviceModel)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a field name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field `{0}` (expected one of: serial, name, ip, model, day, month, latency)")]
pub struct ParseFieldError(pub String);

impl FromStr for Field {
    type Err = ParseFieldError;

    /// Accepts the camelCase name, the snake_case name, or the short alias
    /// (`serial`, `name`, `ip`, `model`, `day`, `month`, `latency`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim().to_ascii_lowercase().as_str() {
            "serial" | "serialnumber" | "serial_number" => Field::SerialNumber,
            "name" | "devicename" | "device_name" => Field::DeviceName,
            "ip" | "deviceip" | "device_ip" => Field::DeviceIp,
            "model" | "devicemodel" | "device_model" => Field::DeviceModel,
            "day" | "fabday" | "fab_day" => Field::FabDay,
            "month" | "fabmonth" | "fab_month" => Field::FabMonth,
            "latency" => Field::Latency,
            _ => return Err(ParseFieldError(s.to_string())),
        };
        Ok(field)
    }
}

// =============================================================================
// DEVICE DESCRIPTOR
// =============================================================================

/// Structured description of a device, as typed into the form.
///
/// All fields are plain text. The engine never mutates a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceDescriptor {
    /// Identifier shaped `XXXX-XXXX`, uppercase.
    pub serial_number: String,
    /// Free-text device label.
    pub device_name: String,
    /// Dotted-decimal-like address text.
    pub device_ip: String,
    /// Identifier shaped `XXX-XXX`, uppercase.
    pub device_model: String,
    /// Fabrication day, `"01"`-`"31"`.
    pub fab_day: String,
    /// Fabrication month, `"01"`-`"12"`.
    pub fab_month: String,
    /// Non-negative integer milliseconds, as text.
    pub latency: String,
}

/// Default fabrication day and month of a fresh form.
pub const DEFAULT_FAB_DATE_PART: &str = "01";

impl DeviceDescriptor {
    /// The state of a freshly reset form: everything empty except the
    /// fabrication day and month, which start at `"01"`.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            fab_day: DEFAULT_FAB_DATE_PART.to_string(),
            fab_month: DEFAULT_FAB_DATE_PART.to_string(),
            ..Self::default()
        }
    }

    /// Read a field by name.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::SerialNumber => &self.serial_number,
            Field::DeviceName => &self.device_name,
            Field::DeviceIp => &self.device_ip,
            Field::DeviceModel => &self.device_model,
            Field::FabDay => &self.fab_day,
            Field::FabMonth => &self.fab_month,
            Field::Latency => &self.latency,
        }
    }

    /// Overwrite a field by name, as-is.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::SerialNumber => &mut self.serial_number,
            Field::DeviceName => &mut self.device_name,
            Field::DeviceIp => &mut self.device_ip,
            Field::DeviceModel => &mut self.device_model,
            Field::FabDay => &mut self.fab_day,
            Field::FabMonth => &mut self.fab_month,
            Field::Latency => &mut self.latency,
        };
        *slot = value.into();
    }

    /// Fields that are still empty, in declaration order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|&field| self.get(field).is_empty())
            .collect()
    }

    /// Check that every field is filled in.
    ///
    /// Whitespace counts as content; only the empty string is missing.
    pub fn validate(&self) -> Result<(), crate::DeriveError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(crate::DeriveError::Incomplete(missing))
        }
    }

    /// Whether every field is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        Field::ALL
            .into_iter()
            .all(|field| !self.get(field).is_empty())
    }

    /// Shape advisories for the non-empty fields.
    ///
    /// Empty fields are reported by [`missing_fields`](Self::missing_fields)
    /// instead.
    #[must_use]
    pub fn advisories(&self) -> Vec<Advisory> {
        Field::ALL
            .into_iter()
            .filter(|&field| {
                let value = self.get(field);
                !value.is_empty() && !shape_matches(field, value)
            })
            .map(Advisory::for_field)
            .collect()
    }
}

// =============================================================================
// ADVISORIES
// =============================================================================

/// A non-blocking note that a field does not have its expected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advisory {
    /// The offending field.
    pub field: Field,
    /// Human-readable description of the expected shape.
    pub expected: &'static str,
}

impl Advisory {
    fn for_field(field: Field) -> Self {
        let expected = match field {
            Field::SerialNumber => "XXXX-XXXX (letters and digits)",
            Field::DeviceModel => "XXX-XXX (letters and digits)",
            Field::FabDay => "a two-digit day 01-31",
            Field::FabMonth => "a two-digit month 01-12",
            Field::Latency => "a non-negative whole number of milliseconds",
            Field::DeviceName | Field::DeviceIp => "any text",
        };
        Self { field, expected }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} should be {}", self.field, self.expected)
    }
}

fn shape_matches(field: Field, value: &str) -> bool {
    match field {
        Field::SerialNumber => is_grouped_alnum(value, 4, 4),
        Field::DeviceModel => is_grouped_alnum(value, 3, 3),
        Field::FabDay => is_two_digit_in(value, 1, 31),
        Field::FabMonth => is_two_digit_in(value, 1, 12),
        Field::Latency => value.bytes().all(|b| b.is_ascii_digit()),
        Field::DeviceName | Field::DeviceIp => true,
    }
}

/// `head` alphanumerics, a dash, then `tail` alphanumerics.
fn is_grouped_alnum(value: &str, head: usize, tail: usize) -> bool {
    match value.split_once('-') {
        Some((left, right)) => {
            left.len() == head
                && right.len() == tail
                && left.bytes().all(|b| b.is_ascii_alphanumeric())
                && right.bytes().all(|b| b.is_ascii_alphanumeric())
        }
        None => false,
    }
}

fn is_two_digit_in(value: &str, low: u8, high: u8) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let number = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    (low..=high).contains(&number)
}

// =============================================================================
// TESTS
// =============================================================================
