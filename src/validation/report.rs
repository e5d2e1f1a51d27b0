//! Validation Findings
//!
//! The error record every validator emits and the report the orchestrator
//! hands back to callers. Findings are data, never Rust errors.

use std::fmt;

use serde::Serialize;

use crate::layout::Phase;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Identifier of the rule a finding violates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    // whole-file structure
    FieldCountMismatch,
    MissingTerminalRecord,
    EntityLimitExceeded,
    NoEntities,
    // record sequence
    InvalidRecordSequence,
    UnknownRecordType,
    // entity structure
    DuplicateEntity,
    MissingRequiredRecord,
    ForbiddenRecord,
    ManagerLimitExceeded,
    ClassLimitExceeded,
    DuplicateClass,
    ClassMissingPersonLink,
    ClassMissingStaffLink,
    UnknownClassReference,
    DanglingLinkage,
    // situation phase
    MissingPrimaryRecord,
    EmptyEntity,
    InvalidCharacterPhaseTwo,
    // auxiliary screen
    InvalidCharacter,
    InternalValidationError,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::FieldCountMismatch => "field_count_mismatch",
            Rule::MissingTerminalRecord => "missing_terminal_record",
            Rule::EntityLimitExceeded => "entity_limit_exceeded",
            Rule::NoEntities => "no_entities",
            Rule::InvalidRecordSequence => "invalid_record_sequence",
            Rule::UnknownRecordType => "unknown_record_type",
            Rule::DuplicateEntity => "duplicate_entity",
            Rule::MissingRequiredRecord => "missing_required_record",
            Rule::ForbiddenRecord => "forbidden_record",
            Rule::ManagerLimitExceeded => "manager_limit_exceeded",
            Rule::ClassLimitExceeded => "class_limit_exceeded",
            Rule::DuplicateClass => "duplicate_class",
            Rule::ClassMissingPersonLink => "class_missing_person_link",
            Rule::ClassMissingStaffLink => "class_missing_staff_link",
            Rule::UnknownClassReference => "unknown_class_reference",
            Rule::DanglingLinkage => "dangling_linkage",
            Rule::MissingPrimaryRecord => "missing_primary_record",
            Rule::EmptyEntity => "empty_entity",
            Rule::InvalidCharacterPhaseTwo => "invalid_character_phase_two",
            Rule::InvalidCharacter => "invalid_character",
            Rule::InternalValidationError => "internal_validation_error",
        }
    }

    /// Whole-file failures after which downstream checks are meaningless
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Rule::FieldCountMismatch | Rule::MissingTerminalRecord | Rule::NoEntities
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structural finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// 1-based line, 0 when the finding concerns the whole file
    pub line: usize,
    pub record_type: String,
    /// 1-based field position, None for the whole record or entity
    pub field: Option<usize>,
    /// The offending raw value
    pub value: String,
    pub rule: Rule,
    pub message: String,
    pub severity: Severity,
}

impl ValidationError {
    pub fn new(
        rule: Rule,
        line: usize,
        record_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            record_type: record_type.into(),
            field: None,
            value: String::new(),
            rule,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn with_field(mut self, position: usize) -> Self {
        self.field = Some(position);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Synthetic finding for a fault inside the engine itself
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            Rule::InternalValidationError,
            0,
            "",
            format!("Internal validation error: {}", message),
        )
        .with_value(message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "line {}: {} [{}] {}", self.line, severity, self.rule, self.message)
    }
}

/// Outcome of validating one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub phase: Phase,
    pub errors: Vec<ValidationError>,
    /// Non-blank lines seen
    pub lines_processed: usize,
    /// Primary records seen
    pub entities_found: usize,
    /// Whether critical file-level failures skipped the remaining checks
    pub short_circuited: bool,
}

impl ValidationReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            errors: Vec::new(),
            lines_processed: 0,
            entities_found: 0,
            short_circuited: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.errors.iter().any(|e| e.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count_severity(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_severity(Severity::Warning)
    }

    fn count_severity(&self, severity: Severity) -> usize {
        self.errors.iter().filter(|e| e.severity == severity).count()
    }

    /// Findings for one rule, in report order
    pub fn errors_for(&self, rule: Rule) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.rule == rule).collect()
    }

    pub fn has_rule(&self, rule: Rule) -> bool {
        self.errors.iter().any(|e| e.rule == rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_report() {
        let mut report = ValidationReport::new(Phase::Enrollment);
        assert!(report.is_valid());

        report.errors.push(
            ValidationError::new(Rule::InvalidCharacter, 1, "00", "lowercase")
                .with_severity(Severity::Warning),
        );
        assert!(report.is_valid()); // Warnings don't make it invalid

        report
            .errors
            .push(ValidationError::new(Rule::NoEntities, 0, "00", "no schools"));
        assert!(!report.is_valid());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(report.has_rule(Rule::NoEntities));
        assert_eq!(report.errors_for(Rule::DuplicateEntity).len(), 0);
    }

    #[test]
    fn test_critical_rules() {
        assert!(Rule::FieldCountMismatch.is_critical());
        assert!(Rule::MissingTerminalRecord.is_critical());
        assert!(Rule::NoEntities.is_critical());
        assert!(!Rule::EntityLimitExceeded.is_critical());
        assert!(!Rule::InvalidRecordSequence.is_critical());
    }

    #[test]
    fn test_rule_serializes_as_identifier() {
        let error = ValidationError::internal("boom");
        let json = serde_json::to_value(&error).expect("serialize");

        assert_eq!(json["rule"], "internal_validation_error");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["value"], "boom");
        assert_eq!(json["field"], serde_json::Value::Null);
        assert_eq!(Rule::DanglingLinkage.to_string(), "dangling_linkage");
    }
}
