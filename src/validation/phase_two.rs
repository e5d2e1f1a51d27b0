//! Situation Phase Structural Validation
//!
//! Entity rules specific to the follow-up phase: exactly one header per
//! school, no student record for an undeclared school, at least one student
//! record per school, and the strict character rule on the phase's records.

use crate::layout::RecordRole;
use crate::validation::charset;
use crate::validation::context::ValidationContext;
use crate::validation::report::{Rule, Severity, ValidationError};

pub fn validate(context: &ValidationContext<'_>) -> Vec<ValidationError> {
    let layout = context.layout;
    let primary = layout.primary_code();
    let mut errors = Vec::new();

    for entity in context.entities.iter() {
        let headers: Vec<_> = entity
            .records
            .iter()
            .filter(|r| r.record_type == primary)
            .collect();

        if headers.len() > 1 {
            errors.push(
                ValidationError::new(
                    Rule::DuplicateEntity,
                    headers[1].line,
                    primary,
                    format!(
                        "School {} has {} header records {}, exactly one is allowed",
                        entity.code,
                        headers.len(),
                        primary
                    ),
                )
                .with_value(&entity.code),
            );
        }

        let has_students = entity
            .records
            .iter()
            .any(|r| layout.role_of(&r.record_type) == Some(RecordRole::Secondary));
        if !has_students {
            errors.push(
                ValidationError::new(
                    Rule::EmptyEntity,
                    entity.line(),
                    primary,
                    format!("School {} has no student situation record", entity.code),
                )
                .with_value(&entity.code)
                .with_severity(Severity::Warning),
            );
        }
    }

    for orphan in &context.orphans {
        if layout.role_of(&orphan.record_type) != Some(RecordRole::Secondary) {
            continue;
        }
        let key = orphan.field(layout.key_field).unwrap_or_default();
        errors.push(
            ValidationError::new(
                Rule::MissingPrimaryRecord,
                orphan.line,
                &orphan.record_type,
                format!(
                    "Record {} refers to school {}, which has no header record {}",
                    orphan.record_type, key, primary
                ),
            )
            .with_field(layout.key_field + 1)
            .with_value(key),
        );
    }

    if layout.strict_charset {
        for record in context.records {
            let Some(spec) = layout.record(&record.record_type) else {
                continue;
            };
            if spec.role == RecordRole::Terminal {
                continue;
            }
            errors.extend(charset::screen_fields(record, spec.charset_exempt));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout_for, Phase};
    use crate::parser::parse_lines;
    use crate::validation::context::build_context;

    fn check(lines: &[&str]) -> Vec<ValidationError> {
        let records = parse_lines(lines);
        let context = build_context(&records, layout_for(Phase::Situation), None);
        validate(&context)
    }

    #[test]
    fn test_valid_situation_file() {
        let errors = check(&[
            "89|S1|123|JOAO|1|gestor@escola.br",
            "90|S1|T1|11|A1|22|33|1",
            "91|S1|T1|11|A2|22|33|1|2|3|4",
            "99",
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_duplicate_header_reported_once() {
        let errors = check(&[
            "89|S1|1|A|1|X",
            "90|S1|T1|1|1|1|1|1",
            "89|S1|1|A|1|X",
            "89|S1|1|A|1|X",
            "99",
        ]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::DuplicateEntity);
        assert_eq!(errors[0].line, 3);
    }

    #[test]
    fn test_student_record_without_header() {
        let errors = check(&["89|S1|1|A|1|X", "90|S1|T1|1|1|1|1|1", "90|S9|T1|1|1|1|1|1", "99"]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::MissingPrimaryRecord);
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[0].field, Some(2));
        assert_eq!(errors[0].value, "S9");
    }

    #[test]
    fn test_student_record_before_its_header() {
        let errors = check(&[
            "89|S0|1|A|1|X",
            "90|S0|T1|1|1|1|1|1",
            "90|S1|T1|1|1|1|1|1",
            "89|S1|1|A|1|X",
            "90|S1|T1|1|1|1|1|1",
            "99",
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_unknown_record_does_not_fill_a_school() {
        let errors = check(&["89|S1|1|A|1|X", "00|S1|1", "99"]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::EmptyEntity);
        assert_eq!(errors[0].line, 1);
    }

    #[test]
    fn test_school_without_students() {
        let errors = check(&["89|S1|1|A|1|X", "99"]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::EmptyEntity);
        assert_eq!(errors[0].severity, Severity::Warning);
    }

    #[test]
    fn test_strict_characters_on_phase_records_only() {
        let errors = check(&[
            "89|S1|1|Joao|1|gestor@escola.br",
            "90|S1|T1|1|1|1|1|ç",
            "99",
        ]);

        let fields: Vec<_> = errors
            .iter()
            .filter(|e| e.rule == Rule::InvalidCharacterPhaseTwo)
            .map(|e| (e.line, e.field))
            .collect();
        assert_eq!(fields, vec![(1, Some(4)), (2, Some(8))]);
    }
}
