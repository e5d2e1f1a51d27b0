//! Validation Engine
//!
//! Orchestrates the structural checks of one census file: builds the
//! context, runs the whole-file checks, stops there when the file is
//! critically broken, otherwise runs the sequence and entity checks of the
//! file's phase. Findings come back in a fixed, reproducible order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::layout::{detect_phase, layout_for, Phase, PhaseLayout};
use crate::parser::{decode_bytes, parse_lines, LineRecord};
use crate::profile::{Limits, RulesProfile};
use crate::validation::context::build_context;
use crate::validation::report::{ValidationError, ValidationReport};
use crate::validation::{charset, file_level, phase_two, sequence, structure};

/// What to validate against
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions<'a> {
    pub phase: Phase,
    pub limits: Limits,
    /// Raw file bytes for the character screen; skipped when absent
    pub raw: Option<&'a [u8]>,
}

impl<'a> ValidationOptions<'a> {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            limits: Limits::default(),
            raw: None,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_raw(mut self, raw: &'a [u8]) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Findings of the guarded part of a run
struct Outcome {
    errors: Vec<ValidationError>,
    entities_found: usize,
    short_circuited: bool,
}

/// Validate a sequence of census lines
pub fn validate_lines<S: AsRef<str>>(lines: &[S], options: &ValidationOptions<'_>) -> ValidationReport {
    let records = parse_lines(lines);
    let layout = layout_for(options.phase);

    let mut report = ValidationReport::new(options.phase);
    report.lines_processed = records.len();

    let outcome = run_guarded(|| run_checks(&records, layout, options));
    report.errors = outcome.errors;
    report.entities_found = outcome.entities_found;
    report.short_circuited = outcome.short_circuited;

    log::debug!(
        "validated {} records as {}: {} findings{}",
        report.lines_processed,
        report.phase,
        report.errors.len(),
        if report.short_circuited {
            " (short-circuited)"
        } else {
            ""
        }
    );
    report
}

/// Validate a whole document held in memory
///
/// The document's own bytes feed the character screen.
pub fn validate_document(content: &str, phase: Option<Phase>, profile: &RulesProfile) -> ValidationReport {
    let lines: Vec<&str> = content.lines().collect();
    let options = ValidationOptions::new(resolve_phase(phase, &lines, profile))
        .with_limits(profile.limits)
        .with_raw(content.as_bytes());
    validate_lines(&lines, &options)
}

/// Validate raw file bytes (UTF-8, or Latin-1 as a fallback)
pub fn validate_bytes(bytes: &[u8], phase: Option<Phase>, profile: &RulesProfile) -> ValidationReport {
    let content = decode_bytes(bytes);
    let lines: Vec<&str> = content.lines().collect();
    let options = ValidationOptions::new(resolve_phase(phase, &lines, profile))
        .with_limits(profile.limits)
        .with_raw(bytes);
    validate_lines(&lines, &options)
}

/// Explicit phase, else the phase detected from the first record, else the
/// profile's default
pub fn resolve_phase<S: AsRef<str>>(explicit: Option<Phase>, lines: &[S], profile: &RulesProfile) -> Phase {
    explicit
        .or_else(|| detect_phase(lines))
        .or(profile.default_phase)
        .unwrap_or(Phase::Enrollment)
}

fn run_checks(records: &[LineRecord], layout: &'static PhaseLayout, options: &ValidationOptions<'_>) -> Outcome {
    let context = build_context(records, layout, options.raw);
    let mut errors = Vec::new();

    if let Some(raw) = context.raw {
        errors.extend(charset::screen_bytes(raw));
    }

    let file_errors = file_level::validate(&context, &options.limits);
    let critical = file_errors.iter().any(|e| e.rule.is_critical());
    errors.extend(file_errors);

    if critical {
        log::debug!("critical file-level findings, skipping sequence and entity checks");
        return Outcome {
            errors,
            entities_found: context.entities.len(),
            short_circuited: true,
        };
    }

    errors.extend(sequence::validate(&context));
    match layout.phase {
        Phase::Enrollment => errors.extend(structure::validate(&context, &options.limits)),
        Phase::Situation => errors.extend(phase_two::validate(&context)),
    }

    Outcome {
        errors,
        entities_found: context.entities.len(),
        short_circuited: false,
    }
}

/// Run `checks`, turning a panic into a single internal finding
fn run_guarded<F: FnOnce() -> Outcome>(checks: F) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(checks)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("internal validation error: {}", message);
            Outcome {
                errors: vec![ValidationError::internal(message)],
                entities_found: 0,
                short_circuited: false,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
