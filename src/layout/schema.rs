//! Record Layout Types
//!
//! Plain, immutable descriptions of a census phase grammar: which record
//! types exist, how many fields each carries, which may follow which, and
//! what each record type contributes to its entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Census phase: each has its own, disjoint record grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Initial enrollment (record types 00 to 60)
    Enrollment,
    /// Follow-up student situation (record types 89 to 91)
    Situation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Enrollment => write!(f, "enrollment"),
            Phase::Situation => write!(f, "situation"),
        }
    }
}

/// What a record type contributes to the entity it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRole {
    /// Opens a new entity and carries its key (and status, if any)
    Primary,
    /// Only sets the entity's "has record of this type" flag
    Presence,
    /// Declares a class under the entity
    Class,
    /// Links a student (person) to a class
    PersonLink,
    /// Links a staff member to a class
    StaffLink,
    /// Repeatable manager record, counted against a cap
    Manager,
    /// Secondary record naming its entity by key instead of by position
    Secondary,
    /// End-of-file marker, never part of an entity
    Terminal,
}

/// A legal predecessor of a record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predecessor {
    /// The record may be the first one in the file
    FileStart,
    /// The record may directly follow this record type
    Record(&'static str),
}

impl fmt::Display for Predecessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predecessor::FileStart => write!(f, "start of file"),
            Predecessor::Record(code) => write!(f, "{}", code),
        }
    }
}

/// Layout of a single record type
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSpec {
    pub code: &'static str,
    pub description: &'static str,
    /// Exact number of fields, record-type code included
    pub field_count: usize,
    pub role: RecordRole,
    pub predecessors: &'static [Predecessor],
    /// 0-based position of the class code this record declares or links to
    pub class_field: Option<usize>,
    /// 0-based positions excused from the strict character rule
    pub charset_exempt: &'static [usize],
}

impl RecordSpec {
    /// Whether `previous` (None at the start of the file) may precede this record
    pub fn allows_after(&self, previous: Option<&str>) -> bool {
        self.predecessors.iter().any(|p| match (p, previous) {
            (Predecessor::FileStart, None) => true,
            (Predecessor::Record(code), Some(prev)) => *code == prev,
            _ => false,
        })
    }

    /// Human-readable list of allowed predecessors
    pub fn predecessor_list(&self) -> String {
        self.predecessors
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Record sets an entity must and must not carry for one status value
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRule {
    pub status: &'static str,
    pub label: &'static str,
    pub required: &'static [&'static str],
    pub forbidden: &'static [&'static str],
}

/// Complete grammar of one census phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseLayout {
    pub phase: Phase,
    pub records: &'static [RecordSpec],
    /// 0-based position of the entity key on primary (and secondary) records
    pub key_field: usize,
    /// 0-based position of the status value on the primary record
    pub status_field: Option<usize>,
    pub status_rules: &'static [StatusRule],
    /// Whether this phase's own records must be uppercase ASCII only
    pub strict_charset: bool,
}

impl PhaseLayout {
    /// Find a record type by code
    pub fn record(&self, code: &str) -> Option<&RecordSpec> {
        self.records.iter().find(|spec| spec.code == code)
    }

    pub fn role_of(&self, code: &str) -> Option<RecordRole> {
        self.record(code).map(|spec| spec.role)
    }

    /// Code of the record type that opens an entity
    pub fn primary_code(&self) -> &'static str {
        self.code_with_role(RecordRole::Primary)
    }

    /// Code of the end-of-file record type
    pub fn terminal_code(&self) -> &'static str {
        self.code_with_role(RecordRole::Terminal)
    }

    /// Code of the first record type playing `role`, empty if none does
    pub fn code_with_role(&self, role: RecordRole) -> &'static str {
        self.records
            .iter()
            .find(|spec| spec.role == role)
            .map(|spec| spec.code)
            .unwrap_or_default()
    }

    /// Requirements attached to a status value, if the value is recognized
    pub fn status_rule(&self, status: &str) -> Option<&StatusRule> {
        self.status_rules.iter().find(|rule| rule.status == status)
    }

    /// Record types that may legally follow `previous`, in table order
    pub fn records_allowed_after(&self, previous: Option<&str>) -> Vec<&RecordSpec> {
        self.records
            .iter()
            .filter(|spec| spec.role != RecordRole::Terminal && spec.allows_after(previous))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: RecordSpec = RecordSpec {
        code: "20",
        description: "Class",
        field_count: 4,
        role: RecordRole::Class,
        predecessors: &[Predecessor::Record("10"), Predecessor::Record("20")],
        class_field: Some(2),
        charset_exempt: &[],
    };

    #[test]
    fn test_allows_after() {
        assert!(SPEC.allows_after(Some("10")));
        assert!(SPEC.allows_after(Some("20")));
        assert!(!SPEC.allows_after(Some("00")));
        assert!(!SPEC.allows_after(None));
    }

    #[test]
    fn test_predecessor_list() {
        assert_eq!(SPEC.predecessor_list(), "10, 20");

        let first = RecordSpec {
            predecessors: &[Predecessor::FileStart, Predecessor::Record("60")],
            ..SPEC
        };
        assert_eq!(first.predecessor_list(), "start of file, 60");
        assert!(first.allows_after(None));
    }

    #[test]
    fn test_phase_serde_names() {
        assert_eq!(
            serde_json::to_string(&Phase::Situation).expect("serialize"),
            "\"situation\""
        );
        assert_eq!(Phase::Enrollment.to_string(), "enrollment");
    }
}
