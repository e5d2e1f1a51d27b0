//! Census Line Records
//!
//! Minimal, immutable representation of one tokenized census line.
//! No validation logic: a record only knows its fields and position.

use serde::Serialize;

/// A tokenized line of a census file
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// A record with at least one field
    Record(LineRecord),
    /// An empty or whitespace-only line
    Empty,
}

/// One census record: its fields and where it sits in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRecord {
    /// 1-based physical line number
    pub line: usize,
    /// Record-type code (the first field, e.g. "00", "20", "89")
    pub record_type: String,
    /// All field values, including the record-type code at position 0
    pub fields: Vec<String>,
}

impl LineRecord {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        let record_type = fields.first().cloned().unwrap_or_default();
        Self {
            line,
            record_type,
            fields,
        }
    }

    /// Field value at a 0-based index
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}
