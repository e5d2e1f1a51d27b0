//! Entity Structure Validation
//!
//! Per-school invariants of the enrollment phase: one identification
//! record, the record set its operating status requires, manager and class
//! ceilings, and class linkage completeness.

use crate::layout::RecordRole;
use crate::profile::Limits;
use crate::validation::context::{EntityAggregate, LinkKind, ValidationContext};
use crate::validation::report::{Rule, ValidationError};

/// Validate every entity, in order of first appearance
pub fn validate(context: &ValidationContext<'_>, limits: &Limits) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for entity in context.entities.iter() {
        validate_entity(context, entity, limits, &mut errors);
    }
    errors
}

fn validate_entity(
    context: &ValidationContext<'_>,
    entity: &EntityAggregate<'_>,
    limits: &Limits,
    errors: &mut Vec<ValidationError>,
) {
    let layout = context.layout;
    let primary = layout.primary_code();
    let manager = layout.code_with_role(RecordRole::Manager);
    let class = layout.code_with_role(RecordRole::Class);

    if let Some(error) = check_duplicate_primary(entity, primary) {
        errors.push(error);
    }

    // Unrecognized status values carry no structural requirement
    if let Some(rule) = entity
        .status
        .as_deref()
        .and_then(|status| layout.status_rule(status))
    {
        for &required in rule.required {
            if !entity.has_record(required) {
                errors.push(
                    ValidationError::new(
                        Rule::MissingRequiredRecord,
                        entity.line(),
                        required,
                        format!(
                            "School {} is {} and must have a record {} ({})",
                            entity.code,
                            rule.label,
                            required,
                            describe(context, required)
                        ),
                    )
                    .with_value(&entity.code),
                );
            }
        }

        for &forbidden in rule.forbidden {
            if let Some(line) = entity.first_line_of(forbidden) {
                errors.push(
                    ValidationError::new(
                        Rule::ForbiddenRecord,
                        line,
                        forbidden,
                        format!(
                            "School {} is {} and must not have records {} ({}), found {}",
                            entity.code,
                            rule.label,
                            forbidden,
                            describe(context, forbidden),
                            entity.record_count(forbidden)
                        ),
                    )
                    .with_value(&entity.code),
                );
            }
        }
    }

    let managers = entity.record_count(manager);
    if managers > limits.max_managers_per_entity {
        errors.push(
            ValidationError::new(
                Rule::ManagerLimitExceeded,
                entity.line(),
                manager,
                format!(
                    "School {} has {} managers, at most {} are allowed",
                    entity.code, managers, limits.max_managers_per_entity
                ),
            )
            .with_value(managers.to_string()),
        );
    }

    if entity.classes.len() > limits.max_classes_per_entity {
        errors.push(
            ValidationError::new(
                Rule::ClassLimitExceeded,
                entity.line(),
                primary,
                format!(
                    "School {} declares {} classes, at most {} are allowed",
                    entity.code,
                    entity.classes.len(),
                    limits.max_classes_per_entity
                ),
            )
            .with_value(entity.classes.len().to_string()),
        );
    }

    for (class_code, line) in &entity.duplicate_classes {
        errors.push(
            ValidationError::new(
                Rule::DuplicateClass,
                *line,
                class,
                format!(
                    "Class {} of school {} was already declared on line {}",
                    class_code,
                    entity.code,
                    entity.class_line(class_code).unwrap_or(0)
                ),
            )
            .with_value(class_code),
        );
    }

    check_class_linkage(entity, class, errors);
}

fn check_duplicate_primary(entity: &EntityAggregate<'_>, primary: &str) -> Option<ValidationError> {
    let mut primaries = entity.records.iter().filter(|r| r.record_type == primary);
    let first = primaries.next()?;
    let second = primaries.next()?;
    let total = 2 + primaries.count();

    Some(
        ValidationError::new(
            Rule::DuplicateEntity,
            second.line,
            primary,
            format!(
                "School {} is declared {} times (first on line {})",
                entity.code, total, first.line
            ),
        )
        .with_value(&entity.code),
    )
}

fn check_class_linkage(
    entity: &EntityAggregate<'_>,
    class: &str,
    errors: &mut Vec<ValidationError>,
) {
    let link_count = entity.person_link_count + entity.staff_link_count;

    if entity.classes.is_empty() {
        if link_count > 0 {
            let line = entity
                .unresolved_links
                .first()
                .map_or_else(|| entity.line(), |link| link.line);
            errors.push(
                ValidationError::new(
                    Rule::DanglingLinkage,
                    line,
                    class,
                    format!(
                        "School {} links {} students and {} professionals to classes but declares no class",
                        entity.code, entity.person_link_count, entity.staff_link_count
                    ),
                )
                .with_value(link_count.to_string()),
            );
        }
        return;
    }

    // A class with neither link yields two findings, one per missing linkage
    for class_code in entity.classes.iter() {
        let line = entity.class_line(class_code).unwrap_or(0);
        if !entity.person_linked.contains(class_code) {
            errors.push(
                ValidationError::new(
                    Rule::ClassMissingPersonLink,
                    line,
                    class,
                    format!(
                        "Class {} of school {} has no enrolled student (record 60)",
                        class_code, entity.code
                    ),
                )
                .with_value(class_code),
            );
        }
        if !entity.staff_linked.contains(class_code) {
            errors.push(
                ValidationError::new(
                    Rule::ClassMissingStaffLink,
                    line,
                    class,
                    format!(
                        "Class {} of school {} has no linked professional (record 50)",
                        class_code, entity.code
                    ),
                )
                .with_value(class_code),
            );
        }
    }

    for link in &entity.unresolved_links {
        let who = match link.kind {
            LinkKind::Person => "student",
            LinkKind::Staff => "professional",
        };
        errors.push(
            ValidationError::new(
                Rule::UnknownClassReference,
                link.line,
                &link.record_type,
                format!(
                    "Record {} links a {} to class {}, which school {} does not declare",
                    link.record_type, who, link.class_code, entity.code
                ),
            )
            .with_value(&link.class_code),
        );
    }
}

fn describe(context: &ValidationContext<'_>, record_type: &str) -> &'static str {
    context
        .layout
        .record(record_type)
        .map_or("unknown record", |spec| spec.description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout_for, Phase};
    use crate::parser::parse_lines;
    use crate::validation::context::build_context;

    fn check(lines: &[&str]) -> Vec<ValidationError> {
        check_with(lines, Limits::default())
    }

    fn check_with(lines: &[&str], limits: Limits) -> Vec<ValidationError> {
        let records = parse_lines(lines);
        let context = build_context(&records, layout_for(Phase::Enrollment), None);
        validate(&context, &limits)
    }

    fn rules(errors: &[ValidationError]) -> Vec<Rule> {
        errors.iter().map(|e| e.rule).collect()
    }

    #[test]
    fn test_active_school_without_records() {
        let errors = check(&["00|S1|1", "99"]);

        assert_eq!(rules(&errors), vec![Rule::MissingRequiredRecord; 4]);
        let missing: Vec<_> = errors.iter().map(|e| e.record_type.as_str()).collect();
        assert_eq!(missing, vec!["10", "20", "30", "40"]);
        assert!(errors.iter().all(|e| e.line == 1 && e.value == "S1"));
    }

    #[test]
    fn test_complete_active_school() {
        let errors = check(&[
            "00|S1|1",
            "10|S1",
            "20|S1|T1",
            "30|S1|P1",
            "40|S1|P1",
            "50|S1|P2|X|T1",
            "60|S1|P3|X|T1",
            "99",
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_closed_school_with_forbidden_records() {
        let errors = check(&[
            "00|S1|3",
            "10|S1",
            "20|S1|T1",
            "20|S1|T2",
            "30|S1|P1",
            "40|S1|P1",
            "99",
        ]);

        let forbidden: Vec<_> = errors
            .iter()
            .filter(|e| e.rule == Rule::ForbiddenRecord)
            .collect();
        assert_eq!(forbidden.len(), 2);
        assert_eq!(forbidden[0].record_type, "10");
        assert_eq!(forbidden[0].line, 2);
        assert_eq!(forbidden[1].record_type, "20");
        assert_eq!(forbidden[1].line, 3);
        assert!(!errors.iter().any(|e| e.rule == Rule::MissingRequiredRecord));
    }

    #[test]
    fn test_unrecognized_status_has_no_requirements() {
        let errors = check(&["00|S1|7", "99"]);
        assert!(errors.is_empty(), "{:?}", errors);

        let errors = check(&["00|S1", "99"]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_duplicate_school_reported_once() {
        let errors = check(&["00|S1|7", "00|S1|7", "00|S1|7", "99"]);

        assert_eq!(rules(&errors), vec![Rule::DuplicateEntity]);
        assert_eq!(errors[0].line, 2);
        assert!(errors[0].message.contains("declared 3 times"));
    }

    #[test]
    fn test_manager_and_class_ceilings() {
        let limits = Limits {
            max_managers_per_entity: 1,
            max_classes_per_entity: 1,
            ..Limits::default()
        };
        let errors = check_with(
            &["00|S1|7", "20|S1|T1", "20|S1|T2", "40|S1|A", "40|S1|B", "99"],
            limits,
        );

        let managers = errors
            .iter()
            .find(|e| e.rule == Rule::ManagerLimitExceeded)
            .expect("manager ceiling");
        assert_eq!(managers.value, "2");
        let classes = errors
            .iter()
            .find(|e| e.rule == Rule::ClassLimitExceeded)
            .expect("class ceiling");
        assert_eq!(classes.value, "2");
    }

    #[test]
    fn test_class_without_staff_link() {
        let errors = check(&["00|S1|7", "20|S1|T1", "60|S1|P1|X|T1", "99"]);

        assert_eq!(rules(&errors), vec![Rule::ClassMissingStaffLink]);
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[0].value, "T1");
    }

    #[test]
    fn test_class_without_any_link_yields_two_errors() {
        let errors = check(&["00|S1|7", "20|S1|T1", "20|S1|T2", "99"]);

        assert_eq!(
            rules(&errors),
            vec![
                Rule::ClassMissingPersonLink,
                Rule::ClassMissingStaffLink,
                Rule::ClassMissingPersonLink,
                Rule::ClassMissingStaffLink,
            ]
        );
        assert_eq!(errors[2].line, 3);
    }

    #[test]
    fn test_links_without_classes_are_dangling() {
        let errors = check(&["00|S1|7", "50|S1|P1|X|T1", "60|S1|P2|X|T1", "60|S1|P3|X|T1", "99"]);

        assert_eq!(rules(&errors), vec![Rule::DanglingLinkage]);
        assert_eq!(errors[0].value, "3");
        assert_eq!(errors[0].line, 2);
    }

    #[test]
    fn test_link_to_undeclared_class() {
        let errors = check(&[
            "00|S1|7",
            "20|S1|T1",
            "50|S1|P1|X|T1",
            "60|S1|P2|X|T1",
            "60|S1|P3|X|T8",
            "99",
        ]);

        assert_eq!(rules(&errors), vec![Rule::UnknownClassReference]);
        assert_eq!(errors[0].line, 5);
        assert_eq!(errors[0].record_type, "60");
        assert_eq!(errors[0].value, "T8");
    }

    #[test]
    fn test_duplicate_class_declaration() {
        let errors = check(&[
            "00|S1|7",
            "20|S1|T1",
            "20|S1|T1",
            "50|S1|P1|X|T1",
            "60|S1|P2|X|T1",
            "99",
        ]);

        assert_eq!(rules(&errors), vec![Rule::DuplicateClass]);
        assert_eq!(errors[0].line, 3);
        assert!(errors[0].message.contains("line 2"));
    }
}
