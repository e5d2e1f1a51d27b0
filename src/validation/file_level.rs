//! File-Level Structural Validation
//!
//! Whole-file checks that run before anything else: field counts, the
//! terminal record and the entity count.

use crate::profile::Limits;
use crate::validation::context::ValidationContext;
use crate::validation::report::{Rule, ValidationError};

pub fn validate(context: &ValidationContext<'_>, limits: &Limits) -> Vec<ValidationError> {
    let layout = context.layout;
    let primary = layout.primary_code();
    let mut errors = Vec::new();

    for record in context.records {
        let Some(spec) = layout.record(&record.record_type) else {
            continue;
        };
        if record.field_count() != spec.field_count {
            errors.push(
                ValidationError::new(
                    Rule::FieldCountMismatch,
                    record.line,
                    spec.code,
                    format!(
                        "Record {} must have {} fields, found {}",
                        spec.code,
                        spec.field_count,
                        record.field_count()
                    ),
                )
                .with_value(record.field_count().to_string()),
            );
        }
    }

    if !context.has_terminal {
        let terminal = layout.terminal_code();
        errors.push(ValidationError::new(
            Rule::MissingTerminalRecord,
            0,
            terminal,
            format!("File has no end-of-file record ({})", terminal),
        ));
    }

    if context.entity_count > limits.max_entities {
        errors.push(
            ValidationError::new(
                Rule::EntityLimitExceeded,
                0,
                primary,
                format!(
                    "File declares {} schools, the limit is {}",
                    context.entity_count, limits.max_entities
                ),
            )
            .with_value(context.entity_count.to_string()),
        );
    }

    if context.entity_count == 0 {
        errors.push(ValidationError::new(
            Rule::NoEntities,
            0,
            primary,
            format!("File declares no school (no {} record)", primary),
        ));
    }

    errors
}
