//! Census Line Tokenizer
//!
//! Splits a pipe-delimited census line into its ordered field values.
//! No knowledge of record layouts lives here.

/// Field delimiter used by every census record
pub const FIELD_DELIMITER: char = '|';

/// Tokenize a census line into trimmed field values
///
/// A blank (or whitespace-only) line yields no fields at all, so callers can
/// skip it without it consuming a sequence position. Empty fields between
/// delimiters are kept: they count towards the record's field count.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }

    line.split(FIELD_DELIMITER)
        .map(|field| field.trim().to_string())
        .collect()
}
