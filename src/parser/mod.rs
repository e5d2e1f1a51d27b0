//! Census File Parser
//!
//! Turns raw text lines into [`LineRecord`]s. Focused solely on
//! tokenization; record layouts and validation live elsewhere.

use std::borrow::Cow;

pub mod lexer;
pub mod record;

pub use lexer::{tokenize_line, FIELD_DELIMITER};
pub use record::{LineRecord, ParsedLine};

/// Parse a single line of a census file
///
/// `line_number` is the 1-based physical position of the line in the file.
pub fn parse_line(line_number: usize, line: &str) -> ParsedLine {
    let fields = lexer::tokenize_line(line);
    if fields.is_empty() {
        ParsedLine::Empty
    } else {
        ParsedLine::Record(LineRecord::new(line_number, fields))
    }
}

/// Parse a sequence of lines, dropping blank ones
///
/// Blank lines are skipped but still advance the physical line number, so
/// every record keeps its real position in the file.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<LineRecord> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| match parse_line(idx + 1, line.as_ref()) {
            ParsedLine::Record(record) => Some(record),
            ParsedLine::Empty => None,
        })
        .collect()
}

/// Decode file bytes: UTF-8 when valid, otherwise Latin-1
///
/// Census files are expected in a single-byte encoding; in Latin-1 every
/// byte maps to exactly one character, so decoding never fails.
pub fn decode_bytes(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_record() {
        let result = parse_line(1, "00|12345678|1");

        if let ParsedLine::Record(record) = result {
            assert_eq!(record.record_type, "00");
            assert_eq!(record.fields.len(), 3);
            assert_eq!(record.line, 1);
        } else {
            panic!("Expected record");
        }
    }

    #[test]
    fn test_parse_empty_line() {
        let result = parse_line(4, "   ");
        assert!(matches!(result, ParsedLine::Empty));
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(decode_bytes(b"00|1|1"), "00|1|1");
        assert!(matches!(decode_bytes(b"00|1|1"), Cow::Borrowed(_)));
        // 0xC9 alone is not UTF-8: read as Latin-1 'É'
        assert_eq!(decode_bytes(b"30|JOS\xC9"), "30|JOSÉ");
    }

    #[test]
    fn test_parse_lines_keeps_physical_line_numbers() {
        let records = parse_lines(&["00|1|1", "", "  ", "99"]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 1);
        assert_eq!(records[1].line, 4);
        assert_eq!(records[1].record_type, "99");
    }
}
