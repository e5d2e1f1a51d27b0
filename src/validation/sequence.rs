//! Record Sequence Validation
//!
//! Finite-state check of the record grammar: every record type must
//! directly follow one of its allowed predecessors.

use crate::layout::RecordRole;
use crate::validation::context::ValidationContext;
use crate::validation::report::{Rule, ValidationError};

/// Check every transition between consecutive non-blank records
///
/// The previous record type is updated after each record whatever the
/// outcome, so one misplaced record is reported once and does not poison
/// the records that follow it. Terminal records are skipped entirely.
pub fn validate(context: &ValidationContext<'_>) -> Vec<ValidationError> {
    let layout = context.layout;
    let mut errors = Vec::new();
    let mut previous: Option<&str> = None;

    for record in context.records {
        let record_type = record.record_type.as_str();

        let Some(spec) = layout.record(record_type) else {
            errors.push(
                ValidationError::new(
                    Rule::UnknownRecordType,
                    record.line,
                    record_type,
                    format!(
                        "Record type '{}' is not part of the {} layout",
                        record_type, layout.phase
                    ),
                )
                .with_field(1)
                .with_value(record_type),
            );
            previous = Some(record_type);
            continue;
        };

        if spec.role == RecordRole::Terminal {
            continue;
        }

        if !spec.allows_after(previous) {
            let actual = previous.unwrap_or("start of file");
            errors.push(
                ValidationError::new(
                    Rule::InvalidRecordSequence,
                    record.line,
                    record_type,
                    format!(
                        "Record {} cannot follow {}; allowed predecessors: {}",
                        record_type,
                        actual,
                        spec.predecessor_list()
                    ),
                )
                .with_value(actual),
            );
        }

        previous = Some(record_type);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout_for, Phase};
    use crate::parser::parse_lines;
    use crate::validation::context::build_context;

    fn check(phase: Phase, lines: &[&str]) -> Vec<ValidationError> {
        let records = parse_lines(lines);
        let context = build_context(&records, layout_for(phase), None);
        validate(&context)
    }

    #[test]
    fn test_valid_enrollment_sequence() {
        let errors = check(
            Phase::Enrollment,
            &["00|S", "10|S", "20|S", "20|S", "30|S", "40|S", "50|S", "60|S", "00|S", "99"],
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_single_misplaced_record_reported_once() {
        let errors = check(
            Phase::Enrollment,
            &["00|S", "10|S", "40|S", "20|S", "30|S", "40|S", "99"],
        );

        // 40 after 10 is wrong, and 20 after 40 is wrong too; 30 after 20 is fine again
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[0].record_type, "40");
        assert_eq!(errors[0].value, "10");
        assert!(errors[0].message.contains("allowed predecessors: 30, 40"));
        assert_eq!(errors[1].line, 4);
    }

    #[test]
    fn test_first_record_must_allow_file_start() {
        let errors = check(Phase::Enrollment, &["10|S", "99"]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].value, "start of file");
        assert_eq!(errors[0].rule, Rule::InvalidRecordSequence);
    }

    #[test]
    fn test_terminal_records_are_ignored() {
        let errors = check(Phase::Enrollment, &["00|S", "99", "30|S"]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_unknown_record_type() {
        let errors = check(Phase::Enrollment, &["00|S", "89|S", "10|S", "99"]);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].rule, Rule::UnknownRecordType);
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[1].rule, Rule::InvalidRecordSequence);
        assert_eq!(errors[1].value, "89");
    }

    #[test]
    fn test_situation_grammar_is_separate() {
        let ok = check(Phase::Situation, &["89|S", "90|S", "90|S", "91|S", "89|S", "99"]);
        assert!(ok.is_empty(), "{:?}", ok);

        let errors = check(Phase::Situation, &["89|S", "91|S", "90|S", "99"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].record_type, "90");
        assert_eq!(errors[0].value, "91");
    }
}
