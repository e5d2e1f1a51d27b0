//! Character Screens
//!
//! Census files must be uppercase, single-byte, without accents. The
//! file-wide screen works on raw bytes; the strict field rule works on the
//! decoded fields of one phase's records.

use std::sync::LazyLock;

use regex::bytes::Regex as BytesRegex;
use regex::Regex;

use crate::parser::LineRecord;
use crate::validation::report::{Rule, Severity, ValidationError};

static LOWERCASE_OR_HIGH_BYTE: LazyLock<BytesRegex> = LazyLock::new(|| {
    BytesRegex::new(r"(?-u)[a-z\x80-\xFF]").expect("byte screen pattern is valid")
});

static LOWERCASE_OR_NON_ASCII: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]|[^\x00-\x7F]").expect("field screen pattern is valid"));

/// Screen raw file bytes, one warning per offending line
pub fn screen_bytes(raw: &[u8]) -> Vec<ValidationError> {
    raw.split(|&b| b == b'\n')
        .enumerate()
        .filter_map(|(idx, line)| {
            let found = LOWERCASE_OR_HIGH_BYTE.find(line)?;
            let byte = line[found.start()];
            let shown = if byte.is_ascii() {
                (byte as char).to_string()
            } else {
                format!("0x{:02X}", byte)
            };
            let record_type = String::from_utf8_lossy(line)
                .split('|')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();

            Some(
                ValidationError::new(
                    Rule::InvalidCharacter,
                    idx + 1,
                    record_type,
                    format!(
                        "Invalid character {} at column {}: only uppercase letters without accents are accepted",
                        shown,
                        found.start() + 1
                    ),
                )
                .with_value(shown)
                .with_severity(Severity::Warning),
            )
        })
        .collect()
}

/// Strict field rule: one error per field holding lowercase or non-ASCII text
pub fn screen_fields(record: &LineRecord, exempt: &[usize]) -> Vec<ValidationError> {
    record
        .fields
        .iter()
        .enumerate()
        .filter(|(idx, value)| !exempt.contains(idx) && LOWERCASE_OR_NON_ASCII.is_match(value))
        .map(|(idx, value)| {
            ValidationError::new(
                Rule::InvalidCharacterPhaseTwo,
                record.line,
                &record.record_type,
                format!(
                    "Field {} of record {} contains lowercase or accented characters",
                    idx + 1,
                    record.record_type
                ),
            )
            .with_field(idx + 1)
            .with_value(value)
        })
        .collect()
}
