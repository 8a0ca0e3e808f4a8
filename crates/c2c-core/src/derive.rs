//! # Derivation Engine
//!
//! Maps a complete [`DeviceDescriptor`] to an unlock code.
//!
//! The code is four segments concatenated and uppercased:
//!
//! | Segment | Source | Rule |
//! |---------|--------|------|
//! | AA | serial + model | parity of the first serial digit picks the first or last two model characters (dashes removed); `??` if the serial has no digit |
//! | BB | latency + fab date | day if latency < 50, month otherwise; `00` if latency is not a number |
//! | CC | device IP | sum of its digits, zero-padded to width 2 (wider if the sum is ≥ 100) |
//! | DD | device name | vowel and consonant counts, larger count first (consonants first on a tie) |
//!
//! [`try_derive`] exposes failure as a `Result`. [`derive`] is the total
//! wrapper the collaborator calls: it never fails, it returns a
//! [`DerivedCode`] sentinel instead.

use crate::descriptor::{DeviceDescriptor, Field};
use std::fmt;
use thiserror::Error;

/// Segment AA when the serial number has no digit.
pub const NO_DIGIT_SEGMENT: &str = "??";

/// Segment BB when the latency is not a number.
pub const UNPARSABLE_LATENCY_SEGMENT: &str = "00";

/// Latencies strictly below this pick the fabrication day.
pub const LATENCY_THRESHOLD_MS: i64 = 50;

/// Display text of [`DerivedCode::Pending`].
pub const PENDING_TEXT: &str = "PENDING";

/// Display text of [`DerivedCode::Error`].
pub const ERROR_TEXT: &str = "ERROR";

// =============================================================================
// ERRORS
// =============================================================================

/// Why a descriptor could not be turned into a code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    /// One or more fields are empty. Expected while the form is filled in.
    #[error("descriptor incomplete: missing {}", join_fields(.0))]
    Incomplete(Vec<Field>),

    /// An arithmetic step could not be completed.
    #[error("derivation failed: {0}")]
    Computation(&'static str),
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// CODE TYPES
// =============================================================================

/// The four segments of a code, before assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    pub aa: String,
    pub bb: String,
    pub cc: String,
    pub dd: String,
}

impl Segments {
    /// Concatenate and uppercase.
    #[must_use]
    pub fn assemble(&self) -> UnlockCode {
        let mut code = String::with_capacity(
            self.aa.len() + self.bb.len() + self.cc.len() + self.dd.len(),
        );
        code.push_str(&self.aa);
        code.push_str(&self.bb);
        code.push_str(&self.cc);
        code.push_str(&self.dd);
        UnlockCode(code.to_uppercase())
    }
}

/// A successfully derived, uppercase unlock code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnlockCode(String);

impl UnlockCode {
    /// The code text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the code text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UnlockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UnlockCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of a derivation as seen by the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DerivedCode {
    /// A usable code.
    Code(UnlockCode),
    /// Inputs incomplete.
    #[default]
    Pending,
    /// The computation failed.
    Error,
}

impl DerivedCode {
    /// Whether this is a real code that may be saved.
    #[must_use]
    pub fn is_code(&self) -> bool {
        matches!(self, DerivedCode::Code(_))
    }

    /// The code, if any.
    #[must_use]
    pub fn as_code(&self) -> Option<&UnlockCode> {
        match self {
            DerivedCode::Code(code) => Some(code),
            DerivedCode::Pending | DerivedCode::Error => None,
        }
    }

    /// The code text or the sentinel text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            DerivedCode::Code(code) => code.as_str(),
            DerivedCode::Pending => PENDING_TEXT,
            DerivedCode::Error => ERROR_TEXT,
        }
    }
}

impl fmt::Display for DerivedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl From<Result<UnlockCode, DeriveError>> for DerivedCode {
    fn from(result: Result<UnlockCode, DeriveError>) -> Self {
        match result {
            Ok(code) => DerivedCode::Code(code),
            Err(DeriveError::Incomplete(_)) => DerivedCode::Pending,
            Err(DeriveError::Computation(_)) => DerivedCode::Error,
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Derive the code for a descriptor. Total: never fails, never panics.
#[must_use]
pub fn derive(descriptor: &DeviceDescriptor) -> DerivedCode {
    DerivedCode::from(try_derive(descriptor))
}

/// Derive the code for a descriptor, reporting why it could not be produced.
pub fn try_derive(descriptor: &DeviceDescriptor) -> Result<UnlockCode, DeriveError> {
    segments(descriptor).map(|s| s.assemble())
}

/// Compute the four segments of a complete descriptor.
pub fn segments(descriptor: &DeviceDescriptor) -> Result<Segments, DeriveError> {
    descriptor.validate()?;

    Ok(Segments {
        aa: model_segment(&descriptor.serial_number, &descriptor.device_model),
        bb: fab_date_segment(&descriptor.latency, &descriptor.fab_day, &descriptor.fab_month),
        cc: address_segment(&descriptor.device_ip)?,
        dd: name_segment(&descriptor.device_name),
    })
}

/// Segment AA.
fn model_segment(serial: &str, model: &str) -> String {
    let Some(digit) = serial.chars().find_map(ascii_digit_value) else {
        return NO_DIGIT_SEGMENT.to_string();
    };

    let stripped: Vec<char> = model.chars().filter(|&c| c != '-').collect();
    let picked = if digit % 2 == 0 {
        &stripped[..stripped.len().min(2)]
    } else {
        &stripped[stripped.len().saturating_sub(2)..]
    };
    picked.iter().collect()
}

/// Segment BB.
fn fab_date_segment(latency: &str, day: &str, month: &str) -> String {
    match parse_leading_integer(latency) {
        Some(ms) if ms < LATENCY_THRESHOLD_MS => day.to_string(),
        Some(_) => month.to_string(),
        None => UNPARSABLE_LATENCY_SEGMENT.to_string(),
    }
}

/// Segment CC.
fn address_segment(ip: &str) -> Result<String, DeriveError> {
    let sum = ip
        .chars()
        .filter_map(ascii_digit_value)
        .try_fold(0u64, |acc, d| acc.checked_add(u64::from(d)))
        .ok_or(DeriveError::Computation("address digit sum overflowed"))?;
    Ok(format!("{sum:02}"))
}

/// Segment DD.
fn name_segment(name: &str) -> String {
    let (vowels, consonants) = name.chars().fold((0usize, 0usize), |(v, c), ch| {
        if is_vowel(ch) {
            (v + 1, c)
        } else if is_consonant(ch) {
            (v, c + 1)
        } else {
            (v, c)
        }
    });

    if vowels > consonants {
        format!("{vowels}{consonants}")
    } else {
        format!("{consonants}{vowels}")
    }
}

// =============================================================================
// CHARACTER CLASSES
// =============================================================================

fn ascii_digit_value(c: char) -> Option<u8> {
    c.is_ascii_digit().then(|| c as u8 - b'0')
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !is_vowel(c)
}

/// Leading-integer parse: optional leading whitespace, optional sign, then
/// at least one decimal digit. Anything after the digits is ignored.
/// Magnitudes beyond `i64` saturate.
fn parse_leading_integer(text: &str) -> Option<i64> {
    let rest = text.trim_start();
    let (negative, rest) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };

    let digits: Vec<i64> = rest
        .bytes()
        .take_while(u8::is_ascii_digit)
        .map(|b| i64::from(b - b'0'))
        .collect();
    if digits.is_empty() {
        return None;
    }

    let value = digits.into_iter().fold(0i64, |acc, d| {
        let shifted = acc.saturating_mul(10);
        if negative {
            shifted.saturating_sub(d)
        } else {
            shifted.saturating_add(d)
        }
    });
    Some(value)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> DeviceDescriptor {
        DeviceDescriptor {
            serial_number: "A1B2-C3D4".to_string(),
            device_name: "MainServer".to_string(),
            device_ip: "192.168.0.1".to_string(),
            device_model: "GEN-100".to_string(),
            fab_day: "01".to_string(),
            fab_month: "01".to_string(),
            latency: "45".to_string(),
        }
    }

    fn code_of(descriptor: &DeviceDescriptor) -> String {
        derive(descriptor).text().to_string()
    }

    #[test]
    fn reference_descriptor() {
        assert_eq!(code_of(&sample()), "00012864");
    }

    #[test]
    fn reference_segments() {
        let segments = segments(&sample()).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(segments.aa, "00");
        assert_eq!(segments.bb, "01");
        assert_eq!(segments.cc, "28");
        assert_eq!(segments.dd, "64");
    }

    #[test]
    fn incomplete_descriptor_is_pending() {
        let mut descriptor = sample();
        descriptor.device_name.clear();
        assert_eq!(derive(&descriptor), DerivedCode::Pending);
        assert_eq!(derive(&descriptor).text(), "PENDING");
    }

    #[test]
    fn even_first_digit_takes_leading_model_chars() {
        let mut descriptor = sample();
        descriptor.serial_number = "AB4C-1234".to_string();
        descriptor.device_model = "XR7-9QZ".to_string();
        let segments = segments(&descriptor).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(segments.aa, "XR");
    }

    #[test]
    fn odd_first_digit_takes_trailing_model_chars() {
        let mut descriptor = sample();
        descriptor.serial_number = "ABC7-2222".to_string();
        descriptor.device_model = "XR7-9QZ".to_string();
        let segments = segments(&descriptor).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(segments.aa, "QZ");
    }

    #[test]
    fn zero_counts_as_even() {
        let mut descriptor = sample();
        descriptor.serial_number = "ABC0-AAAA".to_string();
        descriptor.device_model = "KLM-NOP".to_string();
        assert!(code_of(&descriptor).starts_with("KL"));
    }

    #[test]
    fn serial_without_digit_uses_placeholder() {
        let mut descriptor = sample();
        descriptor.serial_number = "ABCD-EFGH".to_string();
        assert!(code_of(&descriptor).starts_with("??"));
    }

    #[test]
    fn every_dash_is_stripped_from_model() {
        let mut descriptor = sample();
        descriptor.serial_number = "2AAA-AAAA".to_string();
        descriptor.device_model = "-A-B-C-".to_string();
        let segments = segments(&descriptor).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(segments.aa, "AB");
    }

    #[test]
    fn short_model_yields_what_is_there() {
        let mut descriptor = sample();
        descriptor.device_model = "Q-".to_string();

        descriptor.serial_number = "1AAA-AAAA".to_string();
        let odd = segments(&descriptor).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(odd.aa, "Q");

        descriptor.serial_number = "2AAA-AAAA".to_string();
        let even = segments(&descriptor).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(even.aa, "Q");

        descriptor.device_model = "---".to_string();
        let empty = segments(&descriptor).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(empty.aa, "");
    }

    #[test]
    fn latency_threshold_picks_day_or_month() {
        let mut descriptor = sample();
        descriptor.fab_day = "17".to_string();
        descriptor.fab_month = "09".to_string();

        descriptor.latency = "49".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.bb), Ok("17".to_string()));

        descriptor.latency = "50".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.bb), Ok("09".to_string()));
    }

    #[test]
    fn unparsable_latency_gives_zeroes() {
        let mut descriptor = sample();
        descriptor.latency = "fast".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.bb), Ok("00".to_string()));
    }

    #[test]
    fn latency_parse_takes_leading_integer() {
        assert_eq!(parse_leading_integer("45"), Some(45));
        assert_eq!(parse_leading_integer("  45ms"), Some(45));
        assert_eq!(parse_leading_integer("4.9"), Some(4));
        assert_eq!(parse_leading_integer("-3"), Some(-3));
        assert_eq!(parse_leading_integer("+70"), Some(70));
        assert_eq!(parse_leading_integer("ms45"), None);
        assert_eq!(parse_leading_integer("-"), None);
        assert_eq!(parse_leading_integer(""), None);
        assert_eq!(
            parse_leading_integer("99999999999999999999999"),
            Some(i64::MAX)
        );
        assert_eq!(
            parse_leading_integer("-99999999999999999999999"),
            Some(i64::MIN)
        );
    }

    #[test]
    fn negative_latency_picks_day() {
        let mut descriptor = sample();
        descriptor.fab_day = "22".to_string();
        descriptor.latency = "-800".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.bb), Ok("22".to_string()));
    }

    #[test]
    fn small_address_sum_is_zero_padded() {
        let mut descriptor = sample();
        descriptor.device_ip = "1.0.0.1".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.cc), Ok("02".to_string()));

        descriptor.device_ip = "no digits".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.cc), Ok("00".to_string()));
    }

    #[test]
    fn large_address_sum_keeps_natural_width() {
        let mut descriptor = sample();
        descriptor.device_ip = "999.999.999.999".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.cc), Ok("108".to_string()));
        assert_eq!(code_of(&descriptor).len(), 9);
    }

    #[test]
    fn vowels_lead_when_they_outnumber_consonants() {
        let mut descriptor = sample();
        descriptor.device_name = "Aeon".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.dd), Ok("31".to_string()));
    }

    #[test]
    fn tie_puts_consonants_first() {
        let mut descriptor = sample();
        descriptor.device_name = "Node".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.dd), Ok("22".to_string()));
    }

    #[test]
    fn name_counts_ignore_digits_and_punctuation() {
        let mut descriptor = sample();
        descriptor.device_name = "a-1 b_2 ÉX!".to_string();
        // vowels: a; consonants: b, x
        assert_eq!(segments(&descriptor).map(|s| s.dd), Ok("21".to_string()));
    }

    #[test]
    fn multi_digit_counts_lengthen_code() {
        let mut descriptor = sample();
        descriptor.device_name = "bcdfghjklmnp".to_string();
        assert_eq!(segments(&descriptor).map(|s| s.dd), Ok("120".to_string()));
    }

    #[test]
    fn output_is_uppercased() {
        let mut descriptor = sample();
        descriptor.serial_number = "2AAA-AAAA".to_string();
        descriptor.device_model = "gen-100".to_string();
        descriptor.fab_day = "ab".to_string();
        assert_eq!(code_of(&descriptor), "GEAB2864");
    }

    #[test]
    fn derived_code_sentinels() {
        assert!(!DerivedCode::Pending.is_code());
        assert!(!DerivedCode::Error.is_code());
        assert_eq!(DerivedCode::Error.to_string(), "ERROR");
        assert_eq!(DerivedCode::default(), DerivedCode::Pending);
        assert!(DerivedCode::Pending.as_code().is_none());
    }

    #[test]
    fn computation_error_maps_to_error_sentinel() {
        let failed: Result<UnlockCode, DeriveError> =
            Err(DeriveError::Computation("address digit sum overflowed"));
        assert_eq!(DerivedCode::from(failed), DerivedCode::Error);
    }

    #[test]
    fn incomplete_error_lists_fields() {
        let err = DeriveError::Incomplete(vec![Field::SerialNumber, Field::Latency]);
        assert_eq!(
            err.to_string(),
            "descriptor incomplete: missing serialNumber, latency"
        );
    }

    fn descriptor_strategy() -> impl Strategy<Value = DeviceDescriptor> {
        (
            "[A-Z0-9]{0,4}(-[A-Z0-9]{0,4})?",
            "[ -~]{0,16}",
            "[0-9.]{0,15}",
            "[A-Z0-9]{0,3}(-[A-Z0-9]{0,3})?",
            "([0-3][0-9])?",
            "([01][0-9])?",
            "-?[0-9]{0,4}|[a-z]{1,3}",
        )
            .prop_map(|(serial, name, ip, model, day, month, latency)| DeviceDescriptor {
                serial_number: serial,
                device_name: name,
                device_ip: ip,
                device_model: model,
                fab_day: day,
                fab_month: month,
                latency,
            })
    }

    proptest! {
        #[test]
        fn derive_is_deterministic(descriptor in descriptor_strategy()) {
            prop_assert_eq!(derive(&descriptor), derive(&descriptor));
        }

        #[test]
        fn any_empty_field_is_pending(
            descriptor in descriptor_strategy(),
            index in 0usize..7,
        ) {
            let mut descriptor = descriptor;
            descriptor.set(Field::ALL[index], "");
            prop_assert_eq!(derive(&descriptor), DerivedCode::Pending);
        }

        #[test]
        fn complete_descriptor_yields_uppercase_code(descriptor in descriptor_strategy()) {
            let result = derive(&descriptor);
            if descriptor.is_complete() {
                let text = result.text().to_string();
                prop_assert!(result.is_code());
                prop_assert_eq!(text.clone(), text.to_uppercase());
            } else {
                prop_assert_eq!(result, DerivedCode::Pending);
            }
        }
    }
}
