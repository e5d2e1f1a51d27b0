//! Layout Registry
//!
//! Selects the grammar for a phase and guesses the phase of a file.

use super::enrollment::ENROLLMENT;
use super::schema::{Phase, PhaseLayout};
use super::situation::SITUATION;
use crate::parser::tokenize_line;

/// Grammar for a phase
pub fn layout_for(phase: Phase) -> &'static PhaseLayout {
    match phase {
        Phase::Enrollment => &ENROLLMENT,
        Phase::Situation => &SITUATION,
    }
}

/// All known phase grammars
pub fn all_layouts() -> [&'static PhaseLayout; 2] {
    [&ENROLLMENT, &SITUATION]
}

/// Detect the phase of a file from its first record
///
/// Only the first non-blank line is inspected. The terminal record type is
/// shared by both grammars, so a file starting with it is not conclusive.
pub fn detect_phase<S: AsRef<str>>(lines: &[S]) -> Option<Phase> {
    let first = lines
        .iter()
        .map(|line| tokenize_line(line.as_ref()))
        .find(|fields| !fields.is_empty())?;
    let record_type = first.first()?;

    all_layouts()
        .into_iter()
        .find(|layout| {
            layout.record(record_type).is_some() && layout.terminal_code() != record_type
        })
        .map(|layout| layout.phase)
}
